//! The start/check/list engine that drives an exercise session.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Instant;

use git2::build::CheckoutBuilder;
use log::debug;
use thiserror::Error;

use crate::exercises::exercise::Exercise;
use crate::exercises::goal::GoalStatus;
use crate::exercises::track::Track;
use crate::probes::{ProbeError, RepoProbe};
use crate::progress::{ExerciseState, Progress, ProgressError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no exercise named `{0}` in the manifest")]
    UnknownExercise(String),
    #[error("current branch does not map to any exercise; pass a slug explicitly")]
    NotOnExerciseBranch,
    #[error("branch `{0}` already exists (use --force to restart the exercise)")]
    AlreadyStarted(String),
    #[error("exercise `{0}` has no base to branch from (repository has no commits)")]
    NoBaseCommit(String),
    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress ledger failed: {0}")]
    Progress(#[from] ProgressError),
}

/// Options for a check run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    pub fail_fast: bool,
    pub show_hints: bool,
}

/// An unmet goal carried out of a check run, so the binary can offer hints.
#[derive(Debug)]
pub struct UnmetGoal {
    pub label: String,
    pub hint: Option<String>,
}

/// Result of a check run.
#[derive(Debug)]
pub struct CheckReport {
    pub exit_code: i32,
    pub slug: String,
    pub met: usize,
    pub unmet: Vec<UnmetGoal>,
}

/// ANSI color helpers. Escape codes are only emitted when the target
/// stream is a terminal.
struct Style {
    color: bool,
}

impl Style {
    fn stderr() -> Self {
        Self {
            color: std::io::stderr().is_terminal(),
        }
    }

    fn stdout() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    fn style(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        self.style("1", s)
    }

    fn green(&self, s: &str) -> String {
        self.style("32", s)
    }

    fn red(&self, s: &str) -> String {
        self.style("31", s)
    }

    fn yellow(&self, s: &str) -> String {
        self.style("33", s)
    }

    fn dim(&self, s: &str) -> String {
        self.style("2", s)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let total_secs = d.as_secs();
    let millis = d.subsec_millis();
    if total_secs < 60 {
        let tenths = millis / 100;
        format!("{total_secs}.{tenths}s")
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        let tenths = millis / 100;
        format!("{mins}m {secs}.{tenths}s")
    }
}

/// Begin an exercise: create its work branch, check it out, write seed
/// files, and record it as started.
///
/// # Errors
///
/// Returns `SessionError::UnknownExercise` for a slug not in the manifest,
/// `SessionError::AlreadyStarted` if the work branch exists and `force` is
/// not set, and `SessionError::NoBaseCommit` when the repository has no
/// commit to branch from.
pub fn start(track: &Track, slug: &str, cwd: &Path, force: bool) -> Result<(), SessionError> {
    let sty = Style::stderr();
    let exercise = track
        .find_exercise(slug)
        .ok_or_else(|| SessionError::UnknownExercise(slug.to_string()))?;
    let probe = RepoProbe::discover(cwd)?;
    let mut progress = Progress::load(probe.git_dir())?;

    for req in &exercise.requires {
        if progress.state(req) != Some(ExerciseState::Passed) {
            eprintln!(
                "{}",
                sty.yellow(&format!("note: prerequisite `{req}` has not been passed yet"))
            );
        }
    }

    let branch_name = exercise.work_branch();
    let repo = probe.repo();
    let base = resolve_base(repo, exercise)?;

    if probe.branch_exists(&branch_name) {
        if !force {
            return Err(SessionError::AlreadyStarted(branch_name));
        }
        // A checked-out branch cannot be force-moved; detach HEAD first
        if probe.current_branch()?.as_deref() == Some(branch_name.as_str()) {
            repo.set_head_detached(base.id())?;
        }
        repo.branch(&branch_name, &base, true)?;
        debug!("Reset branch {branch_name} to {}", base.id());
    } else {
        repo.branch(&branch_name, &base, false)?;
        debug!("Created branch {branch_name} at {}", base.id());
    }

    let refname = format!("refs/heads/{branch_name}");
    let target = repo.revparse_single(&refname)?;
    let mut checkout = CheckoutBuilder::new();
    if force {
        checkout.force();
    }
    repo.checkout_tree(&target, Some(&mut checkout))?;
    repo.set_head(&refname)?;

    for seed in &exercise.seeds {
        let dest = probe.workdir().join(&seed.path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&dest, &seed.contents)?;
        debug!("Seeded {}", seed.path.display());
    }

    progress.mark_started(&exercise.slug);
    progress.save(probe.git_dir())?;

    eprintln!("{} {}", sty.bold("Started"), exercise.name);
    eprintln!("{}", sty.dim(&format!("on branch {branch_name}")));
    if !exercise.brief.is_empty() {
        eprintln!();
        eprintln!("{}", exercise.brief.trim_end());
    }
    eprintln!();
    eprintln!(
        "{}",
        sty.dim(&format!(
            "Run `gitgym check {}` when you are done.",
            exercise.slug
        ))
    );
    Ok(())
}

fn resolve_base<'r>(
    repo: &'r git2::Repository,
    exercise: &Exercise,
) -> Result<git2::Commit<'r>, SessionError> {
    match &exercise.base {
        Some(rev) => Ok(repo.revparse_single(rev)?.peel_to_commit()?),
        None => repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|_| SessionError::NoBaseCommit(exercise.slug.clone())),
    }
}

/// Verify every goal of an exercise and report the results.
///
/// When `slug` is `None` the exercise is inferred from the current branch
/// through the `<slug>-<suffix>` naming convention.
///
/// # Errors
///
/// Returns `SessionError::NotOnExerciseBranch` when no slug is given and
/// the current branch names no exercise, or `SessionError::Probe` if
/// inspecting the repository fails.
pub fn check(
    track: &Track,
    slug: Option<&str>,
    cwd: &Path,
    opts: &CheckOptions,
) -> Result<CheckReport, SessionError> {
    let sty = Style::stderr();
    let probe = RepoProbe::discover(cwd)?;
    let exercise = resolve_exercise(track, slug, &probe)?;
    let mut progress = Progress::load(probe.git_dir())?;

    let total = exercise.goals.len();
    let total_start = Instant::now();
    let counter_width = total.to_string().len();
    let mut met = 0usize;
    let mut unmet: Vec<UnmetGoal> = Vec::new();

    eprintln!("{} {}", sty.bold("Checking"), exercise.name);

    for (i, goal) in exercise.goals.iter().enumerate() {
        let idx = i + 1;
        let prefix = format!("[{idx:>counter_width$}/{total}]");
        match goal.verify(&probe, exercise)? {
            GoalStatus::Met => {
                eprintln!("{} {} {}", sty.bold(&prefix), goal.label, sty.green("PASS"));
                met += 1;
            }
            GoalStatus::Unmet(detail) => {
                eprintln!("{} {} {}", sty.bold(&prefix), goal.label, sty.red("FAIL"));
                eprintln!("      {}", sty.dim(&detail));
                if opts.show_hints && let Some(ref hint) = goal.hint {
                    eprintln!("      {}", sty.yellow(&format!("hint: {hint}")));
                }
                unmet.push(UnmetGoal {
                    label: goal.label.clone(),
                    hint: goal.hint.clone(),
                });
                if opts.fail_fast {
                    break;
                }
            }
        }
    }

    eprintln!();
    print_summary(&sty, met, unmet.len(), total, total_start.elapsed());

    let passed = unmet.is_empty();
    progress.record_attempt(&exercise.slug, passed);
    progress.save(probe.git_dir())?;

    if passed {
        eprintln!(
            "{}",
            sty.green(&format!("Exercise `{}` passed!", exercise.slug))
        );
    }

    Ok(CheckReport {
        exit_code: i32::from(!passed),
        slug: exercise.slug.clone(),
        met,
        unmet,
    })
}

fn print_summary(sty: &Style, met: usize, unmet: usize, total: usize, elapsed: std::time::Duration) {
    let mut parts = Vec::new();
    if met > 0 {
        parts.push(sty.green(&format!("{met} met")));
    }
    if unmet > 0 {
        parts.push(sty.red(&format!("{unmet} unmet")));
    }
    let unchecked = total - met - unmet;
    if unchecked > 0 {
        parts.push(sty.yellow(&format!("{unchecked} not checked")));
    }

    eprintln!(
        "{} {} {}",
        sty.bold(&format!("{total} goals:")),
        parts.join(&sty.dim(", ")),
        sty.dim(&format!("({})", format_duration(elapsed)))
    );
}

fn resolve_exercise<'a>(
    track: &'a Track,
    slug: Option<&str>,
    probe: &RepoProbe,
) -> Result<&'a Exercise, SessionError> {
    if let Some(slug) = slug {
        return track
            .find_exercise(slug)
            .ok_or_else(|| SessionError::UnknownExercise(slug.to_string()));
    }
    let Some(current) = probe.current_branch()? else {
        return Err(SessionError::NotOnExerciseBranch);
    };
    track
        .all_exercises()
        .into_iter()
        .find(|exercise| exercise.work_branch() == current)
        .ok_or(SessionError::NotOnExerciseBranch)
}

/// Print the exercise catalog in prerequisite order with progress markers.
///
/// # Errors
///
/// Returns `SessionError::Progress` if the progress ledger is corrupt.
/// Running outside a git repository is not an error; the catalog is
/// printed without markers.
pub fn list(track: &Track, cwd: &Path) -> Result<(), SessionError> {
    let sty = Style::stdout();
    let progress = match RepoProbe::discover(cwd) {
        Ok(probe) => Progress::load(probe.git_dir())?,
        Err(_) => Progress::default(),
    };

    for exercise in topo_sort(&track.all_exercises()) {
        let marker = match progress.state(&exercise.slug) {
            Some(ExerciseState::Passed) => sty.green("[x]"),
            Some(ExerciseState::Started) => sty.yellow("[~]"),
            None => sty.dim("[ ]"),
        };
        let mut line = format!("{marker} {} {}", sty.bold(&exercise.slug), exercise.name);
        if !exercise.requires.is_empty() {
            line.push(' ');
            line.push_str(&sty.dim(&format!("(requires {})", exercise.requires.join(", "))));
        }
        println!("{line}");
    }
    Ok(())
}

/// Topological sort over `requires` using Kahn's algorithm.
/// Exercises with no prerequisites come first, in manifest order.
pub(crate) fn topo_sort<'a>(exercises: &[&'a Exercise]) -> Vec<&'a Exercise> {
    let slugs: HashSet<&str> = exercises.iter().map(|e| e.slug.as_str()).collect();

    // in-degree: count of prerequisites that are in our set
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for exercise in exercises {
        let deg = exercise
            .requires
            .iter()
            .filter(|r| slugs.contains(r.as_str()))
            .count();
        in_degree.insert(&exercise.slug, deg);
        for req in &exercise.requires {
            if slugs.contains(req.as_str()) {
                dependents
                    .entry(req.as_str())
                    .or_default()
                    .push(&exercise.slug);
            }
        }
    }

    let by_slug: HashMap<&str, &&Exercise> =
        exercises.iter().map(|e| (e.slug.as_str(), e)).collect();

    // Seed queue in input order for stable output
    let mut queue: VecDeque<&str> = exercises
        .iter()
        .filter(|e| in_degree.get(e.slug.as_str()) == Some(&0))
        .map(|e| e.slug.as_str())
        .collect();

    let mut result = Vec::with_capacity(exercises.len());
    while let Some(slug) = queue.pop_front() {
        if let Some(exercise) = by_slug.get(slug) {
            result.push(**exercise);
        }
        if let Some(deps) = dependents.get(slug) {
            for &dep_slug in deps {
                if let Some(deg) = in_degree.get_mut(dep_slug) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dep_slug);
                    }
                }
            }
        }
    }

    result
}
