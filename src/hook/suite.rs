//! Test suite phase.
//!
//! The suite runs with the interpreter of the active virtual environment,
//! so a commit is only tested against the project's own dependencies.

use crate::config::SuiteConfig;
use crate::core::error::{Error, Result};
use crate::core::executor::{ExecuteOptions, Executor};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Returns the environment root named by `value`, rejecting unset or empty values.
pub fn environment_root(var: &str, value: Option<OsString>) -> Result<PathBuf> {
    match value {
        Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
        _ => Err(Error::MissingEnvironment {
            var: var.to_string(),
        }),
    }
}

/// Path of `interpreter` inside a virtual environment.
#[must_use]
pub fn interpreter_path(env_root: &Path, interpreter: &str) -> PathBuf {
    if cfg!(windows) {
        env_root.join("Scripts").join(format!("{interpreter}.exe"))
    } else {
        env_root.join("bin").join(interpreter)
    }
}

/// The project's test suite.
#[derive(Debug)]
pub struct TestSuite<'a> {
    config: &'a SuiteConfig,
    root: &'a Path,
}

impl<'a> TestSuite<'a> {
    /// Creates a suite that runs from the repository at `root`.
    #[must_use]
    pub const fn new(config: &'a SuiteConfig, root: &'a Path) -> Self {
        Self { config, root }
    }

    /// Resolves the interpreter from the process environment.
    pub fn interpreter(&self) -> Result<PathBuf> {
        let env_root = environment_root(
            &self.config.env_var,
            std::env::var_os(&self.config.env_var),
        )?;
        let path = interpreter_path(&env_root, &self.config.interpreter);

        if !path.is_file() {
            return Err(Error::InterpreterNotFound { path });
        }

        Ok(path)
    }

    /// Runs the suite with `interpreter` (see [`Self::interpreter`]) and
    /// inherited output.
    pub async fn run(&self, interpreter: &Path) -> Result<()> {
        let timeout = self.config.timeout_duration()?;

        tracing::info!(
            "Running {} {}",
            interpreter.display(),
            self.config.args.join(" ")
        );

        let output = Executor::new()
            .execute(
                interpreter,
                &self.config.args,
                ExecuteOptions::default()
                    .cwd(self.root)
                    .timeout(timeout)
                    .capture_output(false),
            )
            .await?;

        if output.timed_out {
            return Err(Error::TestsTimedOut {
                timeout: self.config.timeout.clone(),
            });
        }

        if !output.success() {
            return Err(Error::TestsFailed {
                exit_code: output.exit_code,
            });
        }

        tracing::debug!(elapsed = ?output.duration, "test suite passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_environment_root_unset() {
        let result = environment_root("VIRTUAL_ENV", None);
        assert!(matches!(
            result,
            Err(Error::MissingEnvironment { var }) if var == "VIRTUAL_ENV"
        ));
    }

    #[test]
    fn test_environment_root_empty() {
        let result = environment_root("VIRTUAL_ENV", Some(OsString::new()));
        assert!(matches!(result, Err(Error::MissingEnvironment { .. })));
    }

    #[test]
    fn test_environment_root_set() {
        let root = environment_root("VIRTUAL_ENV", Some(OsString::from("/srv/venv")))
            .expect("root");
        assert_eq!(root, PathBuf::from("/srv/venv"));
    }

    #[cfg(unix)]
    #[test]
    fn test_interpreter_path_unix() {
        assert_eq!(
            interpreter_path(Path::new("/srv/venv"), "python"),
            PathBuf::from("/srv/venv/bin/python")
        );
    }

    #[test]
    fn test_missing_environment_has_no_interpreter() {
        let config = SuiteConfig {
            env_var: "PCG_TEST_UNSET_MARKER_12345".to_string(),
            ..SuiteConfig::default()
        };
        let temp = TempDir::new().expect("create temp dir");

        let result = TestSuite::new(&config, temp.path()).interpreter();
        assert!(matches!(result, Err(Error::MissingEnvironment { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_exit_code() {
        let temp = TempDir::new().expect("create temp dir");
        let config = SuiteConfig {
            args: vec!["-c".to_string(), "exit 4".to_string()],
            ..SuiteConfig::default()
        };

        let result = TestSuite::new(&config, temp.path())
            .run(Path::new("/bin/sh"))
            .await;
        assert!(matches!(result, Err(Error::TestsFailed { exit_code: 4 })));
    }
}
