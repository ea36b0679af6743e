//! Configuration handling for precommit-gate.
//!
//! Configuration lives in `precommit-gate.toml`, found by walking up from
//! the current directory. Every section falls back to defaults, so an
//! absent file behaves like the classic lint-then-pytest hook.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "precommit-gate.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interactive skip prompt.
    pub gate: GateConfig,
    /// Per-extension lint table.
    pub lint: LintConfig,
    /// Test suite invocation.
    pub suite: SuiteConfig,
    /// Stashing of unstaged changes around the test run.
    pub stash: StashConfig,
}

impl Config {
    /// Loads configuration from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::find_config_file()?;
        Self::load_from(&path)
    }

    /// Loads configuration or returns defaults if not found.
    pub fn load_or_default() -> Result<Self> {
        match Self::find_config_file() {
            Ok(path) => Self::load_from(&path),
            Err(Error::ConfigNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read config", e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config_parse_with_source("Failed to parse TOML", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Finds the configuration file by searching up the directory tree.
    pub fn find_config_file() -> Result<PathBuf> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;

        let mut current = cwd.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::ConfigNotFound {
            path: cwd.join(CONFIG_FILE_NAME),
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if humantime::parse_duration(&self.suite.timeout).is_err() {
            return Err(Error::config_invalid(
                "suite.timeout",
                format!("Invalid duration: {}", self.suite.timeout),
            ));
        }

        if self.suite.env_var.trim().is_empty() {
            return Err(Error::config_invalid("suite.env_var", "must not be empty"));
        }

        if self.suite.interpreter.trim().is_empty() {
            return Err(Error::config_invalid("suite.interpreter", "must not be empty"));
        }

        for (extension, tool) in &self.lint.tools {
            if extension.is_empty() || extension.starts_with('.') {
                return Err(Error::config_invalid(
                    format!("lint.tools.{extension}"),
                    "extension must be non-empty and written without a leading dot",
                ));
            }
            if tool.program.trim().is_empty() {
                return Err(Error::config_invalid(
                    format!("lint.tools.{extension}.program"),
                    "must not be empty",
                ));
            }
        }

        Ok(())
    }

    /// Generates default configuration as a string.
    #[must_use]
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Interactive gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Ask on the terminal whether to skip the checks.
    pub prompt: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { prompt: true }
    }
}

/// Lint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Run the lint phase at all.
    pub enabled: bool,
    /// Lint tools keyed by lowercase file extension, without the dot.
    pub tools: BTreeMap<String, LintTool>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tools: default_lint_tools(),
        }
    }
}

/// A lint command template. The file path is appended as the last argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LintTool {
    /// Executable name or path.
    pub program: String,
    /// Arguments placed before the file path.
    pub args: Vec<String>,
    /// Exit codes treated as a pass.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub non_fatal_exit_codes: Vec<i32>,
}

impl LintTool {
    /// Creates a tool with fixed arguments and no remapped exit codes.
    #[must_use]
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            non_fatal_exit_codes: Vec::new(),
        }
    }

    /// Treats the given exit codes as a pass.
    #[must_use]
    pub fn non_fatal(mut self, codes: &[i32]) -> Self {
        self.non_fatal_exit_codes = codes.to_vec();
        self
    }

    /// Maps a raw exit code to the value added to the lint total.
    #[must_use]
    pub fn normalize_exit_code(&self, code: i32) -> i32 {
        if self.non_fatal_exit_codes.contains(&code) {
            0
        } else {
            code
        }
    }
}

/// Test suite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Variable naming the active virtual environment.
    pub env_var: String,
    /// Interpreter name inside the environment's bin directory.
    pub interpreter: String,
    /// Arguments passed to the interpreter.
    pub args: Vec<String>,
    /// Maximum run time for the suite.
    pub timeout: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            env_var: "VIRTUAL_ENV".to_string(),
            interpreter: "python".to_string(),
            args: vec!["-m".to_string(), "pytest".to_string()],
            timeout: "15m".to_string(),
        }
    }
}

impl SuiteConfig {
    /// Returns the parsed timeout.
    pub fn timeout_duration(&self) -> Result<Duration> {
        humantime::parse_duration(&self.timeout).map_err(|e| {
            Error::config_invalid("suite.timeout", format!("Invalid duration: {e}"))
        })
    }
}

/// Stash settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// Stash unstaged and untracked changes while tests run.
    pub enabled: bool,
    /// Discard changes the test run made to tracked files when restoring
    /// the stash. Without it such changes keep the stash in place.
    pub reset_hard: bool,
}

/// Default lint table.
fn default_lint_tools() -> BTreeMap<String, LintTool> {
    let tidy = LintTool::new("tidy", &["-quiet", "-errors"]).non_fatal(&[1]);

    BTreeMap::from([
        ("py".to_string(), LintTool::new("flake8", &[])),
        ("js".to_string(), LintTool::new("jshint", &[])),
        ("sh".to_string(), LintTool::new("shellcheck", &[])),
        ("html".to_string(), tidy.clone()),
        ("htm".to_string(), tidy),
    ])
}
