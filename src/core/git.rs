//! Git repository operations.
//!
//! This module wraps the handful of `git` invocations the hook needs:
//! repository discovery, the hooks directory, working tree status and the
//! stash commands used to isolate staged content while tests run.

use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// One entry of `git status --porcelain=v1 -z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Two-character status code (index, worktree).
    pub code: String,
    /// Path relative to the repository root. For renames, the new path.
    pub path: PathBuf,
}

impl StatusEntry {
    /// Returns true for files git does not track.
    #[must_use]
    pub fn is_untracked(&self) -> bool {
        self.code == "??"
    }

    /// Returns true for ignored files (only reported with `--ignored`).
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.code == "!!"
    }

    /// Returns true when the file was deleted in the index or worktree.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.code.contains('D')
    }

    /// Returns true if this file has content worth linting.
    #[must_use]
    pub fn is_lintable(&self) -> bool {
        !self.is_untracked() && !self.is_ignored() && !self.is_deleted()
    }
}

/// Parses NUL-separated porcelain v1 status output.
///
/// Rename and copy entries carry their source path as an extra field,
/// which is consumed and dropped.
#[must_use]
pub fn parse_status(raw: &[u8]) -> Vec<StatusEntry> {
    let text = String::from_utf8_lossy(raw);
    let mut fields = text.split('\0').filter(|f| !f.is_empty());
    let mut entries = Vec::new();

    while let Some(field) = fields.next() {
        let (Some(code), Some(path)) = (field.get(..2), field.get(2..)) else {
            continue;
        };
        let path = path.strip_prefix(' ').unwrap_or(path);
        if path.is_empty() {
            continue;
        }

        if code.starts_with('R') || code.starts_with('C') {
            fields.next();
        }

        entries.push(StatusEntry {
            code: code.to_string(),
            path: PathBuf::from(path),
        });
    }

    entries
}

/// Represents a Git repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Root directory of the repository (where .git is).
    root: PathBuf,
    /// Path to the .git directory (or file for worktrees).
    git_dir: PathBuf,
}

impl GitRepo {
    /// Discovers the Git repository from the current directory.
    pub fn discover() -> Result<Self> {
        Self::discover_from(&std::env::current_dir().map_err(|e| Error::io("get current dir", e))?)
    }

    /// Discovers the Git repository from a specific path.
    pub fn discover_from(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel", "--git-dir"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Err(Error::NotGitRepo);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines();

        let root = lines.next().map(PathBuf::from).ok_or(Error::NotGitRepo)?;

        let git_dir = lines
            .next()
            .map(|s| {
                let p = PathBuf::from(s);
                if p.is_absolute() {
                    p
                } else {
                    path.join(p)
                }
            })
            .ok_or(Error::NotGitRepo)?;

        Ok(Self { root, git_dir })
    }

    /// Returns the root directory of the repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .git directory path.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Returns the hooks directory path.
    #[must_use]
    pub fn hooks_dir(&self) -> PathBuf {
        // core.hooksPath wins over .git/hooks
        if let Ok(output) = self.git(&["config", "--get", "core.hooksPath"]) {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    let hooks_path = PathBuf::from(&path);
                    if hooks_path.is_absolute() {
                        return hooks_path;
                    }
                    return self.root.join(hooks_path);
                }
            }
        }

        self.git_dir.join("hooks")
    }

    /// Returns the path to a specific hook.
    #[must_use]
    pub fn hook_path(&self, hook_name: &str) -> PathBuf {
        self.hooks_dir().join(hook_name)
    }

    /// Returns every modified, staged or untracked entry.
    pub fn status(&self) -> Result<Vec<StatusEntry>> {
        let output = self
            .git(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])
            .map_err(|e| Error::io("run git status", e))?;

        if !output.status.success() {
            return Err(Error::git("status", stderr_of(&output)));
        }

        Ok(parse_status(&output.stdout))
    }

    /// Returns the object id `refs/stash` points at, if any.
    pub fn stash_head(&self) -> Result<Option<String>> {
        let output = self
            .git(&["rev-parse", "--quiet", "--verify", "refs/stash"])
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Ok(None);
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!id.is_empty()).then_some(id))
    }

    /// Returns true once `HEAD` points at a commit.
    pub fn has_commits(&self) -> Result<bool> {
        let output = self
            .git(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .map_err(|e| Error::io("run git rev-parse", e))?;

        Ok(output.status.success())
    }

    /// Returns true when no tracked file differs from the index.
    pub fn worktree_matches_index(&self) -> Result<bool> {
        let output = self
            .git(&["diff", "--quiet", "--no-ext-diff"])
            .map_err(|e| Error::io("run git diff", e))?;

        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(Error::git("diff", stderr_of(&output))),
        }
    }

    /// Stashes unstaged and untracked changes, keeping the index intact.
    pub fn stash_push(&self, message: &str) -> Result<()> {
        self.run_checked(
            "stash push",
            &[
                "stash",
                "push",
                "--quiet",
                "--keep-index",
                "--include-untracked",
                "--message",
                message,
            ],
        )
    }

    /// Restores the most recent stash entry, including its index state.
    pub fn stash_pop(&self) -> Result<()> {
        self.run_checked("stash pop", &["stash", "pop", "--quiet", "--index"])
    }

    /// Discards every change to tracked files.
    pub fn reset_hard(&self) -> Result<()> {
        self.run_checked("reset --hard", &["reset", "--hard", "--quiet"])
    }

    /// Removes untracked files and directories. Ignored files are kept.
    pub fn clean_untracked(&self) -> Result<()> {
        self.run_checked("clean", &["clean", "-fd", "--quiet"])
    }

    fn run_checked(&self, operation: &str, args: &[&str]) -> Result<()> {
        tracing::debug!(operation, "git {}", args.join(" "));
        let output = self
            .git(args)
            .map_err(|e| Error::io(format!("run git {operation}"), e))?;

        if !output.status.success() {
            return Err(Error::git(operation, stderr_of(&output)));
        }

        Ok(())
    }

    fn git(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
    }
}

fn stderr_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}
