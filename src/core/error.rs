//! Error types for precommit-gate.
//!
//! Every failure aborts the commit. The driver prints the error, its
//! [`hint`](Error::hint) and exits with code 1.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Short message printed when an error has no hint of its own.
pub const GENERIC_HINT: &str = "Error occurred";

/// All possible errors in precommit-gate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Test suite errors
    // =========================================================================
    /// The environment marker variable is unset or empty.
    #[error("Environment variable {var} is not set")]
    MissingEnvironment {
        /// Name of the variable that was expected.
        var: String,
    },

    /// The interpreter was not found inside the active environment.
    #[error("Interpreter not found: {path}")]
    InterpreterNotFound {
        /// Path where the interpreter was expected.
        path: PathBuf,
    },

    /// The test runner exited with a non-zero code.
    #[error("Test suite failed with exit code {exit_code}")]
    TestsFailed {
        /// Exit code of the test runner.
        exit_code: i32,
    },

    /// The test runner did not finish in time.
    #[error("Test suite timed out after {timeout}")]
    TestsTimedOut {
        /// Timeout as configured.
        timeout: String,
    },

    // =========================================================================
    // Lint errors
    // =========================================================================
    /// A lint tool binary could not be found in PATH.
    #[error("Lint tool '{tool}' for .{extension} files not found")]
    LintToolNotFound {
        /// Program name from the lint table.
        tool: String,
        /// Extension that selected the tool.
        extension: String,
    },

    /// One or more files have lint findings.
    #[error("Lint failed ({total}): {}", .files.join(", "))]
    LintFailed {
        /// Sum of normalized lint exit codes.
        total: i32,
        /// Files whose lint run returned a non-zero normalized code.
        files: Vec<String>,
    },

    // =========================================================================
    // Interruption
    // =========================================================================
    /// The user pressed Ctrl-C.
    #[error("Interrupted")]
    Interrupted,

    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path where config was expected.
        path: PathBuf,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        /// Description of the parse error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    ConfigInvalid {
        /// Field name that is invalid.
        field: String,
        /// Description of why it's invalid.
        message: String,
    },

    // =========================================================================
    // Git errors
    // =========================================================================
    /// Not in a Git repository.
    #[error("Not in a Git repository")]
    NotGitRepo,

    /// Git operation failed.
    #[error("Git operation failed: {operation} - {message}")]
    GitOperation {
        /// Name of the operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    /// Hook already exists and wasn't created by us.
    #[error("Git hook already exists at {path}. Use --force to overwrite.")]
    HookExists {
        /// Path to existing hook.
        path: PathBuf,
    },

    // =========================================================================
    // I/O errors
    // =========================================================================
    /// File I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of what failed.
        message: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Internal error (should never happen).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration parse error with source.
    pub fn config_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new invalid configuration error.
    pub fn config_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new I/O error with context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new Git operation error.
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GitOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Short advice shown under the error when the commit is aborted.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingEnvironment { .. } => {
                Some("Activate the project's virtual environment before committing")
            },
            Self::InterpreterNotFound { .. } => {
                Some("The active virtual environment has no usable interpreter")
            },
            Self::TestsFailed { .. } => Some("Tests failed"),
            Self::TestsTimedOut { .. } => Some("Tests took too long"),
            Self::LintToolNotFound { .. } => {
                Some("Install the lint tool or remove it from [lint.tools]")
            },
            Self::LintFailed { .. } => Some("Fix the lint findings above"),
            Self::NotGitRepo => Some("Run pcg from inside a Git repository"),
            Self::ConfigNotFound { .. } => Some("Run: pcg init"),
            Self::HookExists { .. } => Some("Run: pcg install --force"),
            _ => None,
        }
    }

    /// Returns the hint, or the generic message when none is defined.
    #[must_use]
    pub fn hint_or_default(&self) -> &'static str {
        self.hint().unwrap_or(GENERIC_HINT)
    }

    /// Returns true if this is a user-correctable error.
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingEnvironment { .. }
                | Self::LintToolNotFound { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigInvalid { .. }
                | Self::NotGitRepo
                | Self::HookExists { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // =========================================================================
    // Display tests
    // =========================================================================

    #[test]
    fn test_display_missing_environment() {
        let err = Error::MissingEnvironment {
            var: "VIRTUAL_ENV".to_string(),
        };
        assert_eq!(err.to_string(), "Environment variable VIRTUAL_ENV is not set");
    }

    #[test]
    fn test_display_tests_failed() {
        let err = Error::TestsFailed { exit_code: 2 };
        assert_eq!(err.to_string(), "Test suite failed with exit code 2");
    }

    #[test]
    fn test_display_lint_tool_not_found() {
        let err = Error::LintToolNotFound {
            tool: "flake8".to_string(),
            extension: "py".to_string(),
        };
        assert_eq!(err.to_string(), "Lint tool 'flake8' for .py files not found");
    }

    #[test]
    fn test_display_lint_failed() {
        let err = Error::LintFailed {
            total: 3,
            files: vec!["a.py".to_string(), "b.js".to_string()],
        };
        assert_eq!(err.to_string(), "Lint failed (3): a.py, b.js");
    }

    #[test]
    fn test_display_interrupted() {
        assert_eq!(Error::Interrupted.to_string(), "Interrupted");
    }

    #[test]
    fn test_display_git_operation() {
        let err = Error::git("stash pop", "conflict");
        assert_eq!(err.to_string(), "Git operation failed: stash pop - conflict");
    }

    #[test]
    fn test_display_io() {
        let err = Error::io("read config", std::io::Error::other("file not found"));
        assert_eq!(err.to_string(), "I/O error: read config");
    }

    // =========================================================================
    // Hint tests
    // =========================================================================

    #[rstest]
    #[case::missing_env(Error::MissingEnvironment { var: "VIRTUAL_ENV".into() })]
    #[case::tests_failed(Error::TestsFailed { exit_code: 1 })]
    #[case::lint_failed(Error::LintFailed { total: 1, files: vec![] })]
    #[case::tool_missing(Error::LintToolNotFound { tool: "x".into(), extension: "y".into() })]
    fn test_hint_defined(#[case] err: Error) {
        assert!(err.hint().is_some());
        assert_ne!(err.hint_or_default(), GENERIC_HINT);
    }

    #[rstest]
    #[case::internal(Error::Internal { message: "x".into() })]
    #[case::git(Error::git("status", "boom"))]
    #[case::io(Error::io("x", std::io::Error::other("y")))]
    #[case::interrupted(Error::Interrupted)]
    fn test_hint_falls_back_to_generic(#[case] err: Error) {
        assert!(err.hint().is_none());
        assert_eq!(err.hint_or_default(), "Error occurred");
    }

    // =========================================================================
    // Constructor tests
    // =========================================================================

    #[test]
    fn test_config_parse_with_source_has_source() {
        use std::error::Error as StdError;
        let toml_err = toml::from_str::<toml::Value>("bad").expect_err("should fail");
        let err = Error::config_parse_with_source("msg", toml_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_invalid_constructor() {
        let err = Error::config_invalid("suite.timeout", "Invalid duration: soon");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: suite.timeout - Invalid duration: soon"
        );
    }

    // =========================================================================
    // is_user_error tests
    // =========================================================================

    #[test]
    fn test_is_user_error() {
        assert!(Error::MissingEnvironment { var: "X".into() }.is_user_error());
        assert!(Error::NotGitRepo.is_user_error());
        assert!(!Error::TestsFailed { exit_code: 1 }.is_user_error());
        assert!(!Error::Interrupted.is_user_error());
    }
}
