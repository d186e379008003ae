//! Read-only inspection of the repository state exercises are graded against.

use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Repository};
use log::debug;
use thiserror::Error;

/// Errors that can occur while inspecting repository state
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),
    #[error("Unable to read worktree file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Repository at {0} has no worktree")]
    Bare(PathBuf),
}

/// A discovered repository plus its worktree root.
pub struct RepoProbe {
    repo: Repository,
    workdir: PathBuf,
}

impl RepoProbe {
    /// Discover the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Git` if no repository is found and
    /// `ProbeError::Bare` for repositories without a worktree.
    pub fn discover(path: &Path) -> Result<Self, ProbeError> {
        let repo = Repository::discover(path)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| ProbeError::Bare(repo.path().to_path_buf()))?
            .to_path_buf();
        debug!("Probing repository at {}", workdir.display());
        Ok(RepoProbe { repo, workdir })
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Path to the `.git` directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Shorthand name of the branch HEAD is on, or `None` when HEAD is
    /// detached or the repository has no commits yet.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Git` on repository access failure.
    pub fn current_branch(&self) -> Result<Option<String>, ProbeError> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(str::to_string))
    }

    #[must_use]
    pub fn branch_exists(&self, name: &str) -> bool {
        self.repo.find_branch(name, BranchType::Local).is_ok()
    }

    /// Collect all non-ignored changed paths in the worktree.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Git` if the status scan fails.
    pub fn changed_paths(&self) -> Result<Vec<PathBuf>, ProbeError> {
        let changes: Vec<PathBuf> = self
            .repo
            .statuses(None)?
            .iter()
            .filter(|entry| !entry.status().is_ignored())
            .filter_map(|status| status.path().map(PathBuf::from))
            .collect();
        debug!(
            "Found {} changed files in {}",
            changes.len(),
            self.workdir.display()
        );
        Ok(changes)
    }

    /// Read a worktree file, returning `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Io` for read failures other than absence.
    pub fn read_file(&self, path: &Path) -> Result<Option<String>, ProbeError> {
        match std::fs::read_to_string(self.workdir.join(path)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a glob pattern matches at least one path under the worktree.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Pattern` if the pattern is invalid.
    pub fn any_path_matches(&self, pattern: &str) -> Result<bool, ProbeError> {
        let full = self.workdir.join(pattern);
        Ok(glob::glob(&full.to_string_lossy())?
            .filter_map(Result::ok)
            .next()
            .is_some())
    }

    /// Number of commits reachable from HEAD but not from `base`.
    /// With no base this counts the entire history behind HEAD.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Git` if `base` does not resolve or the walk fails.
    pub fn commits_ahead(&self, base: Option<&str>) -> Result<usize, ProbeError> {
        let head = match self.repo.head() {
            Ok(head) => head.peel_to_commit()?,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut walk = self.repo.revwalk()?;
        walk.push(head.id())?;
        if let Some(base) = base {
            let base_obj = self.repo.revparse_single(base)?;
            walk.hide(base_obj.peel_to_commit()?.id())?;
        }
        let mut count = 0;
        for oid in walk {
            oid?;
            count += 1;
        }
        Ok(count)
    }

    /// Message of the HEAD commit, or `None` when the repository has no
    /// commits or the message is not valid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Git` on repository access failure.
    pub fn head_message(&self) -> Result<Option<String>, ProbeError> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(head.peel_to_commit()?.message().map(str::to_string))
    }

    /// Whether the tip of `branch` is an ancestor of (or equal to) HEAD.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Git` if the branch does not exist or the
    /// ancestry query fails.
    pub fn is_merged(&self, branch: &str) -> Result<bool, ProbeError> {
        let tip = self
            .repo
            .find_branch(branch, BranchType::Local)?
            .get()
            .peel_to_commit()?
            .id();
        let head = match self.repo.head() {
            Ok(head) => head.peel_to_commit()?.id(),
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        Ok(tip == head || self.repo.graph_descendant_of(head, tip)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;

    fn init_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Probe Test").unwrap();
            config.set_str("user.email", "probe@gitgym.invalid").unwrap();
        }
        repo
    }

    fn commit_file(repo: &Repository, name: &str, message: &str) {
        std::fs::write(repo.workdir().unwrap().join(name), "contents\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Probe Test", "probe@gitgym.invalid").unwrap();
        let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_current_branch_unborn() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let probe = RepoProbe::discover(dir.path()).unwrap();
        assert_eq!(probe.current_branch().unwrap(), None);
    }

    #[test]
    fn test_current_branch_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "a.txt", "first");
        let probe = RepoProbe::discover(dir.path()).unwrap();
        assert!(probe.current_branch().unwrap().is_some());
    }

    #[test]
    fn test_changed_paths_sees_untracked() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "a.txt", "first");
        let probe = RepoProbe::discover(dir.path()).unwrap();
        assert!(probe.changed_paths().unwrap().is_empty());

        std::fs::write(dir.path().join("scratch.txt"), "dirt\n").unwrap();
        let changed = probe.changed_paths().unwrap();
        assert_eq!(changed, vec![PathBuf::from("scratch.txt")]);
    }

    #[test]
    fn test_commits_ahead_of_base() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "a.txt", "first");
        let base = repo.head().unwrap().shorthand().unwrap().to_string();
        let head_commit = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("work", &head_commit, false).unwrap();
        repo.set_head("refs/heads/work").unwrap();
        commit_file(&repo, "b.txt", "second");

        let probe = RepoProbe::discover(dir.path()).unwrap();
        assert_eq!(probe.commits_ahead(Some(&base)).unwrap(), 1);
        assert_eq!(probe.commits_ahead(None).unwrap(), 2);
    }

    #[test]
    fn test_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "a.txt", "first");
        let head_commit = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("side", &head_commit, false).unwrap();
        commit_file(&repo, "b.txt", "second");

        let probe = RepoProbe::discover(dir.path()).unwrap();
        // side's tip is an ancestor of HEAD
        assert!(probe.is_merged("side").unwrap());
    }

    #[test]
    fn test_read_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let probe = RepoProbe::discover(dir.path()).unwrap();
        assert_eq!(probe.read_file(Path::new("nope.txt")).unwrap(), None);
    }
}
