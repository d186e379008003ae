//! Per-repository progress ledger.
//!
//! The ledger lives inside the `.git` directory so it never dirties the
//! worktree the exercises grade.

use std::collections::HashMap;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PROGRESS_FILE: &str = "gitgym-progress.json";

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("unable to read or write progress ledger: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress ledger is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseState {
    Started,
    Passed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub state: ExerciseState,
    pub attempts: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Progress {
    pub exercises: HashMap<String, ExerciseRecord>,
}

impl Progress {
    /// Load the ledger from the `.git` directory; a missing file yields the
    /// default empty ledger.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Json` when the file exists but cannot be
    /// parsed, or `ProgressError::Io` for other read failures.
    pub fn load(git_dir: &Path) -> Result<Progress, ProgressError> {
        match std::fs::read_to_string(git_dir.join(PROGRESS_FILE)) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Progress::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Io` on write failure.
    pub fn save(&self, git_dir: &Path) -> Result<(), ProgressError> {
        let path = git_dir.join(PROGRESS_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved progress to {}", path.display());
        Ok(())
    }

    /// Mark an exercise as started. Restarting a passed exercise moves it
    /// back to started.
    pub fn mark_started(&mut self, slug: &str) {
        let record = self
            .exercises
            .entry(slug.to_string())
            .or_insert(ExerciseRecord {
                state: ExerciseState::Started,
                attempts: 0,
            });
        record.state = ExerciseState::Started;
    }

    /// Record a check attempt, promoting the exercise to passed on success.
    pub fn record_attempt(&mut self, slug: &str, passed: bool) {
        let record = self
            .exercises
            .entry(slug.to_string())
            .or_insert(ExerciseRecord {
                state: ExerciseState::Started,
                attempts: 0,
            });
        record.attempts += 1;
        if passed {
            record.state = ExerciseState::Passed;
        }
    }

    #[must_use]
    pub fn state(&self, slug: &str) -> Option<ExerciseState> {
        self.exercises.get(slug).map(|record| record.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut progress = Progress::default();
        progress.mark_started("first");
        progress.record_attempt("first", true);
        progress.save(dir.path()).unwrap();

        let loaded = Progress::load(dir.path()).unwrap();
        assert_eq!(loaded.state("first"), Some(ExerciseState::Passed));
        assert_eq!(loaded.exercises["first"].attempts, 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let progress = Progress::load(dir.path()).unwrap();
        assert!(progress.exercises.is_empty());
    }

    #[test]
    fn test_failed_attempt_keeps_started() {
        let mut progress = Progress::default();
        progress.mark_started("first");
        progress.record_attempt("first", false);
        assert_eq!(progress.state("first"), Some(ExerciseState::Started));
        assert_eq!(progress.exercises["first"].attempts, 1);
    }

    #[test]
    fn test_restart_demotes_passed() {
        let mut progress = Progress::default();
        progress.record_attempt("first", true);
        progress.mark_started("first");
        assert_eq!(progress.state("first"), Some(ExerciseState::Started));
    }
}
