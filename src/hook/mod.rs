//! The pre-commit hook itself.
//!
//! A run is a fixed sequence:
//! - [`gate`]: ask whether to skip
//! - [`lint`]: lint modified files by extension
//! - [`stash`]: set unstaged work aside
//! - [`suite`]: run the test suite
//!
//! and finally restores the stash, whatever the suite's result.

pub mod gate;
pub mod lint;
pub mod stash;
pub mod suite;

use crate::config::Config;
use crate::core::error::Result;
use crate::core::git::GitRepo;
use gate::{Decision, Gate};
use lint::{LintReport, Linter};
use stash::Stash;
use std::time::{Duration, Instant};
use suite::TestSuite;

/// How a hook run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user skipped the checks.
    Skipped,
    /// Lint and tests passed.
    Passed {
        /// Lint summary (zeroed when linting is disabled).
        lint: LintReport,
        /// Wall time of the whole run.
        duration: Duration,
    },
}

/// Runs the hook against one repository.
#[derive(Debug)]
pub struct Hook {
    config: Config,
    repo: GitRepo,
}

impl Hook {
    /// Creates a hook for `repo` using `config`.
    #[must_use]
    pub const fn new(config: Config, repo: GitRepo) -> Self {
        Self { config, repo }
    }

    /// Runs every phase in order.
    pub async fn run(&self, gate: Gate) -> Result<Outcome> {
        if gate.decide().await? == Decision::Skip {
            tracing::debug!("checks skipped at prompt");
            return Ok(Outcome::Skipped);
        }

        let start = Instant::now();

        let lint = if self.config.lint.enabled {
            let entries = self.repo.status()?;
            Linter::new(&self.config.lint, self.repo.root())
                .run(&entries)
                .await?
        } else {
            LintReport::default()
        };

        self.test_isolated().await?;

        Ok(Outcome::Passed {
            lint,
            duration: start.elapsed(),
        })
    }

    /// Runs the suite, stashing around it when configured.
    async fn test_isolated(&self) -> Result<()> {
        let suite = TestSuite::new(&self.config.suite, self.repo.root());
        let interpreter = suite.interpreter()?;

        let stash = if self.config.stash.enabled {
            Stash::save(&self.repo, self.config.stash.reset_hard)?
        } else {
            None
        };

        let tested = suite.run(&interpreter).await;

        let Some(stash) = stash else {
            return tested;
        };

        match (tested, stash.restore()) {
            (Err(e), Err(restore_err)) => {
                tracing::warn!(error = %restore_err, "failed to restore stash after test failure");
                Err(e)
            },
            (Err(e), Ok(())) => Err(e),
            (Ok(()), restored) => restored,
        }
    }
}
