use std::path::PathBuf;

use crate::exercises::goal::Goal;

/// Branch suffix used when neither the exercise nor any parent track sets one.
pub const DEFAULT_SUFFIX: &str = "work";

/// A single guided exercise, graded against repository state
#[derive(Debug, Clone, Default)]
pub struct Exercise {
    pub slug: String,
    pub name: String,
    pub brief: String,
    pub base: Option<String>,
    pub suffix: Option<String>,
    pub goals: Vec<Goal>,
    pub requires: Vec<String>,
    pub seeds: Vec<SeedFile>,
}

/// A file written into the worktree when an exercise starts
#[derive(Debug, Clone, Default)]
pub struct SeedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl Exercise {
    /// Name of the branch a learner solves this exercise on.
    #[must_use]
    pub fn work_branch(&self) -> String {
        format!(
            "{}-{}",
            self.slug,
            self.suffix.as_deref().unwrap_or(DEFAULT_SUFFIX)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_branch_default_suffix() {
        let exercise = Exercise {
            slug: "first-commit".to_string(),
            ..Default::default()
        };
        assert_eq!(exercise.work_branch(), "first-commit-work");
    }

    #[test]
    fn test_work_branch_custom_suffix() {
        let exercise = Exercise {
            slug: "first-commit".to_string(),
            suffix: Some("sandbox".to_string()),
            ..Default::default()
        };
        assert_eq!(exercise.work_branch(), "first-commit-sandbox");
    }
}
