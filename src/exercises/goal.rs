use std::path::PathBuf;

use regex_cache::LazyRegex;

use crate::exercises::exercise::Exercise;
use crate::probes::{ProbeError, RepoProbe};

/// A verifiable condition an exercise is graded on
#[derive(Debug, Clone)]
pub struct Goal {
    /// Human-readable description printed in check output
    pub label: String,
    /// Shown on failure when hints are requested
    pub hint: Option<String>,
    pub kind: GoalKind,
}

#[derive(Debug, Clone)]
pub enum GoalKind {
    BranchExists { branch: String },
    OnWorkBranch,
    CleanWorktree,
    FileExists { pattern: String },
    FileMatches { path: PathBuf, pattern: LazyRegex },
    CommitsAhead { count: usize, base: Option<String> },
    MessageMatches { pattern: LazyRegex },
    BranchMerged { branch: String },
}

/// Outcome of verifying a single goal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalStatus {
    Met,
    /// Carries a detail message explaining what was found instead
    Unmet(String),
}

impl Goal {
    /// Verify this goal against the repository state.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError` if inspecting the repository fails. An unmet goal
    /// is not an error; it is reported through `GoalStatus::Unmet`.
    pub fn verify(&self, probe: &RepoProbe, exercise: &Exercise) -> Result<GoalStatus, ProbeError> {
        match &self.kind {
            GoalKind::BranchExists { branch } => {
                if probe.branch_exists(branch) {
                    Ok(GoalStatus::Met)
                } else {
                    Ok(GoalStatus::Unmet(format!(
                        "no local branch named `{branch}`"
                    )))
                }
            }
            GoalKind::OnWorkBranch => {
                let expected = exercise.work_branch();
                match probe.current_branch()? {
                    Some(current) if current == expected => Ok(GoalStatus::Met),
                    Some(current) => Ok(GoalStatus::Unmet(format!(
                        "HEAD is on `{current}`, expected `{expected}`"
                    ))),
                    None => Ok(GoalStatus::Unmet(format!(
                        "HEAD is not on a branch, expected `{expected}`"
                    ))),
                }
            }
            GoalKind::CleanWorktree => {
                let changes = probe.changed_paths()?;
                if changes.is_empty() {
                    Ok(GoalStatus::Met)
                } else {
                    Ok(GoalStatus::Unmet(format!(
                        "{} uncommitted change(s), e.g. `{}`",
                        changes.len(),
                        changes[0].display()
                    )))
                }
            }
            GoalKind::FileExists { pattern } => {
                if probe.any_path_matches(pattern)? {
                    Ok(GoalStatus::Met)
                } else {
                    Ok(GoalStatus::Unmet(format!(
                        "nothing in the worktree matches `{pattern}`"
                    )))
                }
            }
            GoalKind::FileMatches { path, pattern } => match probe.read_file(path)? {
                None => Ok(GoalStatus::Unmet(format!(
                    "file `{}` does not exist",
                    path.display()
                ))),
                Some(contents) if pattern.is_match(&contents) => Ok(GoalStatus::Met),
                Some(_) => Ok(GoalStatus::Unmet(format!(
                    "file `{}` exists but its contents do not match",
                    path.display()
                ))),
            },
            GoalKind::CommitsAhead { count, base } => {
                let base = base.as_deref().or(exercise.base.as_deref());
                let ahead = probe.commits_ahead(base)?;
                if ahead >= *count {
                    Ok(GoalStatus::Met)
                } else {
                    Ok(GoalStatus::Unmet(format!(
                        "found {ahead} commit(s), need at least {count}"
                    )))
                }
            }
            GoalKind::MessageMatches { pattern } => match probe.head_message()? {
                None => Ok(GoalStatus::Unmet("repository has no commits yet".to_string())),
                Some(message) if pattern.is_match(&message) => Ok(GoalStatus::Met),
                Some(_) => Ok(GoalStatus::Unmet(
                    "HEAD commit message does not match".to_string(),
                )),
            },
            GoalKind::BranchMerged { branch } => {
                if !probe.branch_exists(branch) {
                    return Ok(GoalStatus::Unmet(format!(
                        "no local branch named `{branch}`"
                    )));
                }
                if probe.is_merged(branch)? {
                    Ok(GoalStatus::Met)
                } else {
                    Ok(GoalStatus::Unmet(format!(
                        "`{branch}` has commits not reachable from HEAD"
                    )))
                }
            }
        }
    }
}
