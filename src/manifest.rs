//! Exercise manifest handling for gitgym

use std::path::{Path, PathBuf};

use log::{debug, info};
use regex_cache::LazyRegex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::exercises::exercise::{Exercise, SeedFile};
use crate::exercises::goal::{Goal, GoalKind};
use crate::exercises::track::Track;

/// Errors that can occur while loading the exercise manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("No manifest found in current directory or its parents: {0}")]
    ManifestNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML manifest {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON manifest {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Invalid regex pattern `{pattern}`: {source}")]
    Regex {
        source: regex::Error,
        pattern: String,
    },
    #[error("Invalid glob pattern `{pattern}`: {source}")]
    Glob {
        source: glob::PatternError,
        pattern: String,
    },
    #[error("Duplicate slug in manifest: {0}")]
    DuplicateSlug(String),
    #[error("Invalid manifest: {0}")]
    Validation(String),
}

/// Compile a regex pattern string, keeping the original text for error reporting.
///
/// # Errors
///
/// Returns `ManifestError::Regex` if the pattern fails to compile.
pub fn parse_pattern(pattern: &str) -> Result<LazyRegex, ManifestError> {
    LazyRegex::new(pattern).map_err(|e| ManifestError::Regex {
        source: e,
        pattern: pattern.to_string(),
    })
}

fn parse_glob(pattern: &str) -> Result<String, ManifestError> {
    glob::Pattern::new(pattern).map_err(|e| ManifestError::Glob {
        source: e,
        pattern: pattern.to_string(),
    })?;
    Ok(pattern.to_string())
}

/// A single goal as written in the manifest
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManifestGoal {
    BranchExists {
        branch: String,
        hint: Option<String>,
    },
    OnWorkBranch {
        hint: Option<String>,
    },
    CleanWorktree {
        hint: Option<String>,
    },
    FileExists {
        path: String,
        hint: Option<String>,
    },
    FileMatches {
        path: PathBuf,
        pattern: String,
        hint: Option<String>,
    },
    CommitsAhead {
        count: usize,
        base: Option<String>,
        hint: Option<String>,
    },
    MessageMatches {
        pattern: String,
        hint: Option<String>,
    },
    BranchMerged {
        branch: String,
        hint: Option<String>,
    },
}

impl TryFrom<ManifestGoal> for Goal {
    type Error = ManifestError;

    fn try_from(config: ManifestGoal) -> Result<Self, Self::Error> {
        Ok(match config {
            ManifestGoal::BranchExists { branch, hint } => Goal {
                label: format!("branch `{branch}` exists"),
                hint,
                kind: GoalKind::BranchExists { branch },
            },
            ManifestGoal::OnWorkBranch { hint } => Goal {
                label: "HEAD is on the work branch".to_string(),
                hint,
                kind: GoalKind::OnWorkBranch,
            },
            ManifestGoal::CleanWorktree { hint } => Goal {
                label: "worktree is clean".to_string(),
                hint,
                kind: GoalKind::CleanWorktree,
            },
            ManifestGoal::FileExists { path, hint } => Goal {
                label: format!("file `{path}` exists"),
                hint,
                kind: GoalKind::FileExists {
                    pattern: parse_glob(&path)?,
                },
            },
            ManifestGoal::FileMatches {
                path,
                pattern,
                hint,
            } => Goal {
                label: format!("file `{}` matches `{pattern}`", path.display()),
                hint,
                kind: GoalKind::FileMatches {
                    path,
                    pattern: parse_pattern(&pattern)?,
                },
            },
            ManifestGoal::CommitsAhead { count, base, hint } => Goal {
                label: match &base {
                    Some(base) => format!("at least {count} commit(s) ahead of `{base}`"),
                    None => format!("at least {count} commit(s)"),
                },
                hint,
                kind: GoalKind::CommitsAhead { count, base },
            },
            ManifestGoal::MessageMatches { pattern, hint } => Goal {
                label: format!("HEAD commit message matches `{pattern}`"),
                hint,
                kind: GoalKind::MessageMatches {
                    pattern: parse_pattern(&pattern)?,
                },
            },
            ManifestGoal::BranchMerged { branch, hint } => Goal {
                label: format!("branch `{branch}` is merged into HEAD"),
                hint,
                kind: GoalKind::BranchMerged { branch },
            },
        })
    }
}

/// A seed file written into the worktree when an exercise starts
#[derive(Debug, Deserialize, Serialize)]
pub struct ManifestSeed {
    pub path: PathBuf,
    pub contents: String,
}

impl From<ManifestSeed> for SeedFile {
    fn from(config: ManifestSeed) -> Self {
        SeedFile {
            path: config.path,
            contents: config.contents,
        }
    }
}

/// A single exercise as written in the manifest
#[derive(Debug, Deserialize, Serialize)]
pub struct ManifestExercise {
    pub slug: String,
    pub name: String,
    pub brief: Option<String>,
    pub base: Option<String>,
    pub suffix: Option<String>,
    pub goals: Option<Vec<ManifestGoal>>,
    pub requires: Option<Vec<String>>,
    pub seeds: Option<Vec<ManifestSeed>>,
}

impl TryFrom<ManifestExercise> for Exercise {
    type Error = ManifestError;

    fn try_from(config: ManifestExercise) -> Result<Self, Self::Error> {
        let goals = config
            .goals
            .unwrap_or_default()
            .into_iter()
            .map(Goal::try_from)
            .collect::<Result<Vec<Goal>, ManifestError>>()?;
        Ok(Exercise {
            slug: config.slug,
            name: config.name,
            brief: config.brief.unwrap_or_default(),
            base: config.base,
            suffix: config.suffix,
            goals,
            requires: config.requires.unwrap_or_default(),
            seeds: config
                .seeds
                .unwrap_or_default()
                .into_iter()
                .map(SeedFile::from)
                .collect(),
        })
    }
}

/// A track of related exercises as written in the manifest
#[derive(Debug, Deserialize, Serialize)]
pub struct ManifestTrack {
    pub id: Option<String>,
    pub name: String,
    pub base: Option<String>,
    pub suffix: Option<String>,
    pub exercises: Option<Vec<ManifestExercise>>,
    pub children: Option<Vec<ManifestTrack>>,
}

impl TryFrom<ManifestTrack> for Track {
    type Error = ManifestError;

    fn try_from(config: ManifestTrack) -> Result<Self, Self::Error> {
        let children = config
            .children
            .unwrap_or_default()
            .into_iter()
            .map(Track::try_from)
            .collect::<Result<Vec<Track>, ManifestError>>()?;
        let exercises = config
            .exercises
            .unwrap_or_default()
            .into_iter()
            .map(Exercise::try_from)
            .collect::<Result<Vec<Exercise>, ManifestError>>()?;
        Ok(Track {
            id: config.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: config.name,
            base: config.base,
            suffix: config.suffix,
            exercises,
            children,
        })
    }
}

/// Root manifest structure for gitgym
#[derive(Debug, Deserialize, Serialize)]
pub struct Manifest {
    pub gitgym_version: String,
    #[serde(flatten)]
    pub root: ManifestTrack,
}

/// List of supported manifest file names
const FILENAMES: [&str; 3] = [".gitgym.json", ".gitgym.yaml", ".gitgym.yml"];

impl Manifest {
    /// Loads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::ManifestNotFound` if the file cannot be read, or
    /// `ManifestError::Yaml`/`ManifestError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Manifest, ManifestError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ManifestError::ManifestNotFound(file.to_path_buf()))?;
        let manifest: Manifest = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ManifestError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ManifestError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        Ok(manifest)
    }

    /// Searches for a manifest file in the current directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::UnknownWorkingDirectory` if the cwd cannot be determined,
    /// or `ManifestError::ManifestNotFound` if no manifest file is found.
    pub fn find_manifest() -> Result<PathBuf, ManifestError> {
        let manifest_path = std::env::current_dir()
            .map_err(|e| ManifestError::UnknownWorkingDirectory(e.to_string()))?;
        let mut path = manifest_path.clone();
        debug!("Searching for manifest in {}", manifest_path.display());
        loop {
            for file in &FILENAMES {
                let manifest_path = path.join(file);
                if manifest_path.exists() {
                    info!("Found manifest: {}", manifest_path.display());
                    return Ok(manifest_path);
                }
            }
            if !path.pop() {
                return Err(ManifestError::ManifestNotFound(manifest_path));
            }
        }
    }
}
