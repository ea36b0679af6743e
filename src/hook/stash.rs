//! Stashing of unstaged work around the test run.
//!
//! Tests should see exactly what is about to be committed, so unstaged and
//! untracked changes are set aside first and restored afterwards whatever
//! the test outcome.

use crate::core::error::{Error, Result};
use crate::core::git::{GitRepo, StatusEntry};

/// Message recorded on stash entries created by the hook.
pub const STASH_MESSAGE: &str = "precommit-gate: unstaged changes";

/// A stash entry created by [`Stash::save`] that must be restored.
#[derive(Debug)]
#[must_use = "a saved stash must be restored"]
pub struct Stash<'a> {
    repo: &'a GitRepo,
    reset_hard: bool,
}

impl<'a> Stash<'a> {
    /// Stashes unstaged and untracked changes.
    ///
    /// Returns `None` when there was nothing to stash, so that an older,
    /// unrelated stash entry is never popped. A repository without commits
    /// cannot be stashed either; tests then run in place.
    pub fn save(repo: &'a GitRepo, reset_hard: bool) -> Result<Option<Self>> {
        if !repo.has_commits()? {
            tracing::debug!("no commits yet, running tests without stashing");
            return Ok(None);
        }

        let before = repo.stash_head()?;
        repo.stash_push(STASH_MESSAGE)?;
        let after = repo.stash_head()?;

        if after.is_none() || after == before {
            tracing::debug!("nothing to stash");
            return Ok(None);
        }

        tracing::debug!("stashed unstaged changes");
        Ok(Some(Self { repo, reset_hard }))
    }

    /// Puts the stashed changes back.
    ///
    /// The tree is reset to `HEAD` and cleaned of untracked files first, so
    /// that `stash pop --index` applies without conflicts; the staged
    /// content and the user's untracked files are recovered from the stash.
    /// If the test run modified tracked files or left untracked ones,
    /// restoring would discard them, so it is refused unless `reset_hard`
    /// is set. On any failure the stash entry is left in place.
    pub fn restore(self) -> Result<()> {
        let result = self.reset_and_pop();
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "stash left in place; restore it with `git stash pop --index`");
        }
        result
    }

    fn reset_and_pop(&self) -> Result<()> {
        let modified = !self.repo.worktree_matches_index()?;
        let created = self.repo.status()?.iter().any(StatusEntry::is_untracked);

        if modified || created {
            if !self.reset_hard {
                let what = if modified {
                    "the test run modified tracked files"
                } else {
                    "the test run left untracked files"
                };
                return Err(Error::git("stash pop", what));
            }
            tracing::warn!("discarding working tree changes made during the test run");
        }

        self.repo.reset_hard()?;
        self.repo.clean_untracked()?;
        self.repo.stash_pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command;
    use tempfile::TempDir;

    fn git(path: &Path, args: &[&str]) {
        Command::new("git")
            .args(args)
            .current_dir(path)
            .output()
            .expect("run git");
    }

    fn create_repo_with_commit() -> (TempDir, GitRepo) {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path();
        git(path, &["init"]);
        git(path, &["config", "user.email", "test@test.com"]);
        git(path, &["config", "user.name", "Test"]);
        std::fs::write(path.join("app.py"), "v1\n").expect("write");
        git(path, &["add", "app.py"]);
        git(path, &["commit", "-m", "init"]);
        let repo = GitRepo::discover_from(path).expect("discover");
        (temp, repo)
    }

    fn read(temp: &TempDir, name: &str) -> String {
        std::fs::read_to_string(temp.path().join(name)).expect("read file")
    }

    #[test]
    fn test_save_clean_tree_returns_none() {
        let (_temp, repo) = create_repo_with_commit();
        assert!(Stash::save(&repo, false).expect("save").is_none());
    }

    #[test]
    fn test_save_clean_tree_ignores_older_stash() {
        let (temp, repo) = create_repo_with_commit();
        std::fs::write(temp.path().join("app.py"), "older work\n").expect("write");
        git(temp.path(), &["stash", "push", "--quiet"]);
        let older = repo.stash_head().expect("head");

        assert!(Stash::save(&repo, false).expect("save").is_none());
        assert_eq!(repo.stash_head().expect("head"), older);
    }

    #[test]
    fn test_save_keeps_index_and_restore_brings_back_unstaged() {
        let (temp, repo) = create_repo_with_commit();
        std::fs::write(temp.path().join("app.py"), "v2 staged\n").expect("write");
        git(temp.path(), &["add", "app.py"]);
        std::fs::write(temp.path().join("app.py"), "v3 unstaged\n").expect("write");
        std::fs::write(temp.path().join("scratch.txt"), "untracked\n").expect("write");

        let stash = Stash::save(&repo, false)
            .expect("save")
            .expect("stash created");
        assert_eq!(read(&temp, "app.py"), "v2 staged\n");
        assert!(!temp.path().join("scratch.txt").exists());

        stash.restore().expect("restore");
        assert_eq!(read(&temp, "app.py"), "v3 unstaged\n");
        assert_eq!(read(&temp, "scratch.txt"), "untracked\n");
    }

    #[test]
    fn test_restore_with_reset_hard_discards_test_changes() {
        let (temp, repo) = create_repo_with_commit();
        std::fs::write(temp.path().join("app.py"), "user edit\n").expect("write");

        let stash = Stash::save(&repo, true).expect("save").expect("stash created");
        std::fs::write(temp.path().join("app.py"), "written by tests\n").expect("write");

        stash.restore().expect("restore");
        assert_eq!(read(&temp, "app.py"), "user edit\n");
    }

    #[test]
    fn test_save_without_commits_runs_in_place() {
        let temp = TempDir::new().expect("create temp dir");
        git(temp.path(), &["init"]);
        std::fs::write(temp.path().join("app.py"), "v1\n").expect("write");
        git(temp.path(), &["add", "app.py"]);
        std::fs::write(temp.path().join("scratch.txt"), "untracked\n").expect("write");
        let repo = GitRepo::discover_from(temp.path()).expect("discover");

        assert!(Stash::save(&repo, false).expect("save").is_none());
        assert_eq!(read(&temp, "app.py"), "v1\n");
        assert_eq!(read(&temp, "scratch.txt"), "untracked\n");
    }

    #[test]
    fn test_restore_refuses_when_tests_rewrite_untracked_file() {
        let (temp, repo) = create_repo_with_commit();
        std::fs::write(temp.path().join("app.py"), "user edit\n").expect("write");
        std::fs::write(temp.path().join("report.xml"), "old report\n").expect("write");

        let stash = Stash::save(&repo, false).expect("save").expect("stash created");
        std::fs::write(temp.path().join("report.xml"), "new report\n").expect("write");

        let result = stash.restore();
        assert!(matches!(result, Err(Error::GitOperation { .. })));
        assert!(repo.stash_head().expect("head").is_some());
    }

    #[test]
    fn test_restore_with_reset_hard_brings_back_untracked_file() {
        let (temp, repo) = create_repo_with_commit();
        std::fs::write(temp.path().join("app.py"), "user edit\n").expect("write");
        std::fs::write(temp.path().join("report.xml"), "old report\n").expect("write");

        let stash = Stash::save(&repo, true).expect("save").expect("stash created");
        std::fs::write(temp.path().join("report.xml"), "new report\n").expect("write");
        std::fs::create_dir_all(temp.path().join("out")).expect("mkdir");
        std::fs::write(temp.path().join("out/junit.xml"), "artifact\n").expect("write");

        stash.restore().expect("restore");
        assert_eq!(read(&temp, "app.py"), "user edit\n");
        assert_eq!(read(&temp, "report.xml"), "old report\n");
        assert!(!temp.path().join("out").exists());
        assert_eq!(repo.stash_head().expect("head"), None);
    }

    #[test]
    fn test_restore_conflict_keeps_stash() {
        let (temp, repo) = create_repo_with_commit();
        std::fs::write(temp.path().join("app.py"), "user edit\n").expect("write");

        let stash = Stash::save(&repo, false).expect("save").expect("stash created");
        std::fs::write(temp.path().join("app.py"), "written by tests\n").expect("write");

        let result = stash.restore();
        assert!(matches!(result, Err(Error::GitOperation { .. })));
        assert!(repo.stash_head().expect("head").is_some());
    }
}
