//! Subprocess execution for lint tools and the test runner.
//!
//! Programs are spawned directly (no shell) with an argument vector. Every
//! wait races a timeout and Ctrl-C; an interrupted child is killed and the
//! call returns [`Error::Interrupted`].

use crate::core::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Output from a command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output (empty when not captured).
    pub stdout: String,
    /// Standard error (empty when not captured).
    pub stderr: String,
    /// Whether the command was killed due to timeout.
    pub timed_out: bool,
    /// Duration the command took to run.
    pub duration: Duration,
}

impl CommandOutput {
    /// Returns true if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Returns combined stdout and stderr output.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Timeout for the command.
    pub timeout: Option<Duration>,
    /// Whether to capture output (vs streaming to console).
    pub capture_output: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            timeout: None,
            capture_output: true,
        }
    }
}

impl ExecuteOptions {
    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl AsRef<Path>) -> Self {
        self.cwd = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets whether to capture output.
    #[must_use]
    pub const fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }
}

/// Executor for running external programs.
#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `program` with `args` and waits for it to exit.
    ///
    /// A timeout is reported through [`CommandOutput::timed_out`] with exit
    /// code 124. Ctrl-C kills the child and returns [`Error::Interrupted`].
    pub async fn execute<I, S>(
        &self,
        program: impl AsRef<OsStr>,
        args: I,
        options: ExecuteOptions,
    ) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let start = std::time::Instant::now();
        let program = program.as_ref();

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

        if let Some(ref cwd) = options.cwd {
            cmd.current_dir(cwd);
        }

        if options.capture_output {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        }

        tracing::debug!(program = %program.to_string_lossy(), "spawning");
        let mut child = cmd
            .spawn()
            .map_err(|e| Error::io(format!("spawn {}", program.to_string_lossy()), e))?;

        let stdout_handle = tokio::spawn(read_all(child.stdout.take()));
        let stderr_handle = tokio::spawn(read_all(child.stderr.take()));

        let deadline = async {
            match options.timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };

        let status = tokio::select! {
            status = child.wait() => status.map_err(|e| Error::io("wait for command", e))?,
            () = deadline => {
                drop(child.kill().await);
                return Ok(CommandOutput {
                    exit_code: 124,
                    stdout: String::new(),
                    stderr: "Command timed out".to_string(),
                    timed_out: true,
                    duration: start.elapsed(),
                });
            },
            _ = tokio::signal::ctrl_c() => {
                drop(child.kill().await);
                return Err(Error::Interrupted);
            },
        };

        let stdout = stdout_handle.await.map_err(|e| Error::Internal {
            message: format!("stdout task failed: {e}"),
        })?;
        let stderr = stderr_handle.await.map_err(|e| Error::Internal {
            message: format!("stderr task failed: {e}"),
        })?;

        Ok(CommandOutput {
            exit_code: status.code().unwrap_or(1),
            stdout,
            stderr,
            timed_out: false,
            duration: start.elapsed(),
        })
    }
}

async fn read_all<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        if let Err(e) = stream.read_to_end(&mut buf).await {
            tracing::debug!(error = %e, "failed to read child output");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_simple_command() {
        let executor = Executor::new();
        let output = executor
            .execute("echo", ["hello"], ExecuteOptions::default())
            .await
            .expect("should succeed");

        assert!(output.success());
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_execute_failing_command() {
        let executor = Executor::new();
        let output = executor
            .execute("sh", ["-c", "exit 3"], ExecuteOptions::default())
            .await
            .expect("should complete");

        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
    }

    #[tokio::test]
    async fn test_execute_captures_stderr() {
        let executor = Executor::new();
        let output = executor
            .execute("sh", ["-c", "echo oops >&2; exit 1"], ExecuteOptions::default())
            .await
            .expect("should complete");

        assert!(output.stderr.contains("oops"));
        assert!(output.combined_output().contains("oops"));
    }

    #[tokio::test]
    async fn test_execute_sets_cwd() {
        let temp = tempfile::TempDir::new().expect("create temp dir");
        let executor = Executor::new();
        let output = executor
            .execute(
                "sh",
                ["-c", "pwd"],
                ExecuteOptions::default().cwd(temp.path()),
            )
            .await
            .expect("should complete");

        let dir_name = temp.path().file_name().expect("name").to_string_lossy();
        assert!(output.stdout.contains(dir_name.as_ref()));
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let executor = Executor::new();
        let output = executor
            .execute(
                "sleep",
                ["10"],
                ExecuteOptions::default().timeout(Duration::from_millis(100)),
            )
            .await
            .expect("should complete");

        assert!(output.timed_out);
        assert_eq!(output.exit_code, 124);
    }

    #[tokio::test]
    async fn test_execute_missing_program() {
        let executor = Executor::new();
        let result = executor
            .execute(
                "definitely_not_a_real_command_12345",
                Vec::<String>::new(),
                ExecuteOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
