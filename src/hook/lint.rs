//! Per-file lint phase.
//!
//! Each modified or staged file is matched against the lint table by
//! extension. The tool's exit code is normalized and added to a running
//! total; a non-zero total after the last file fails the phase.

use crate::config::{LintConfig, LintTool};
use crate::core::error::{Error, Result};
use crate::core::executor::{ExecuteOptions, Executor};
use crate::core::git::StatusEntry;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A file paired with the tool that lints it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintJob<'a> {
    /// Path relative to the repository root.
    pub path: PathBuf,
    /// Extension key that selected the tool.
    pub extension: String,
    /// The tool to run.
    pub tool: &'a LintTool,
}

/// Summary of a successful lint phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LintReport {
    /// Files that were linted.
    pub linted: usize,
    /// Changed files with no matching tool.
    pub skipped: usize,
}

/// Runs lint tools over changed files.
#[derive(Debug)]
pub struct Linter<'a> {
    config: &'a LintConfig,
    root: &'a Path,
    executor: Executor,
}

impl<'a> Linter<'a> {
    /// Creates a linter for the repository at `root`.
    #[must_use]
    pub const fn new(config: &'a LintConfig, root: &'a Path) -> Self {
        Self {
            config,
            root,
            executor: Executor::new(),
        }
    }

    /// Looks up the tool for a path by its lowercase extension.
    #[must_use]
    pub fn tool_for(&self, path: &Path) -> Option<(String, &'a LintTool)> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        let tool = self.config.tools.get(&extension)?;
        Some((extension, tool))
    }

    /// Selects the status entries that have a tool, in status order.
    #[must_use]
    pub fn plan(&self, entries: &[StatusEntry]) -> Vec<LintJob<'a>> {
        entries
            .iter()
            .filter(|entry| entry.is_lintable())
            .filter_map(|entry| match self.tool_for(&entry.path) {
                Some((extension, tool)) => Some(LintJob {
                    path: entry.path.clone(),
                    extension,
                    tool,
                }),
                None => {
                    tracing::debug!(path = %entry.path.display(), "no lint tool for file");
                    None
                },
            })
            .collect()
    }

    /// Lints every planned file, then fails if any finding remains.
    pub async fn run(&self, entries: &[StatusEntry]) -> Result<LintReport> {
        let jobs = self.plan(entries);
        let candidates = entries.iter().filter(|e| e.is_lintable()).count();

        let mut total: i32 = 0;
        let mut failed = Vec::new();

        for job in &jobs {
            let code = self.lint_file(job).await?;
            if code != 0 {
                total = total.saturating_add(code);
                failed.push(job.path.display().to_string());
            }
        }

        if total != 0 || !failed.is_empty() {
            return Err(Error::LintFailed {
                total,
                files: failed,
            });
        }

        Ok(LintReport {
            linted: jobs.len(),
            skipped: candidates - jobs.len(),
        })
    }

    /// Runs one tool and returns its normalized exit code.
    async fn lint_file(&self, job: &LintJob<'_>) -> Result<i32> {
        let program = which::which(&job.tool.program).map_err(|_| Error::LintToolNotFound {
            tool: job.tool.program.clone(),
            extension: job.extension.clone(),
        })?;

        let shown = job.path.display().to_string();
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .ok()
                .unwrap_or_else(ProgressStyle::default_spinner),
        );
        pb.set_message(format!("{} {shown}", job.tool.program));
        pb.enable_steady_tick(Duration::from_millis(100));

        let args = job
            .tool
            .args
            .iter()
            .map(std::ffi::OsString::from)
            .chain(std::iter::once(tool_arg(&job.path)));
        let output = self
            .executor
            .execute(&program, args, ExecuteOptions::default().cwd(self.root))
            .await;

        pb.finish_and_clear();
        let output = output?;

        let code = job.tool.normalize_exit_code(output.exit_code);
        tracing::debug!(
            file = %shown,
            raw = output.exit_code,
            normalized = code,
            "lint finished"
        );

        if code == 0 {
            eprintln!("{} {shown}", style("✓").green());
        } else {
            eprintln!("{} {shown} ({})", style("✗").red(), job.tool.program);
            for line in output.combined_output().lines() {
                eprintln!("    {line}");
            }
        }

        Ok(code)
    }
}

/// The path as handed to a lint tool. Relative paths get a `./` prefix so
/// a file named like `-x.py` is not read as an option.
fn tool_arg(path: &Path) -> std::ffi::OsString {
    if path.is_relative() {
        Path::new(".").join(path).into_os_string()
    } else {
        path.as_os_str().to_os_string()
    }
}
