//! Command-line interface for precommit-gate.
//!
//! This module provides the `pcg` CLI with subcommands for:
//! - `run`: Run the hook (the default)
//! - `init`: Write a configuration file
//! - `install`: Install the git hook
//! - `uninstall`: Remove the git hook
//! - `validate`: Validate configuration
//! - `config`: Show configuration

mod commands;

use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Git pre-commit hook that lints modified files and runs the test suite.
#[derive(Debug, Parser)]
#[command(
    name = "pcg",
    author,
    version,
    about = "Git pre-commit hook that lints modified files and runs the test suite",
    long_about = r#"
precommit-gate (pcg) lints the files you changed, runs your test suite inside
the active virtual environment, and aborts the commit when either fails.

Quick start:
  pcg init      # Create configuration
  pcg install   # Install git hook
  # Done! Each commit now asks whether to run checks.

At the prompt, press Enter to run the checks or type 's' to skip them.

Environment variables:
  PCG_SKIP=1        Skip all checks
  PCG_NO_PROMPT=1   Run checks without asking
  VIRTUAL_ENV       Environment whose interpreter runs the tests
"#,
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Flags for a hook run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Args)]
pub struct RunArgs {
    /// Run checks without asking on the terminal.
    #[arg(long)]
    pub no_prompt: bool,

    /// Skip the lint phase.
    #[arg(long)]
    pub no_lint: bool,

    /// Stash unstaged and untracked changes while tests run.
    #[arg(long, conflicts_with = "no_stash")]
    pub stash: bool,

    /// Do not stash, even if the configuration enables it.
    #[arg(long)]
    pub no_stash: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the pre-commit checks.
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// Initialize precommit-gate configuration.
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite existing configuration.
        #[arg(short, long)]
        force: bool,
    },

    /// Install the git pre-commit hook.
    Install {
        /// Overwrite existing hook.
        #[arg(short, long)]
        force: bool,
    },

    /// Remove the git pre-commit hook.
    Uninstall,

    /// Validate the configuration file.
    #[command(visible_alias = "v")]
    Validate,

    /// Show configuration file location and contents.
    Config {
        /// Output raw TOML.
        #[arg(long)]
        raw: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Runs the CLI.
pub fn run() -> crate::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    setup_color(cli.color);

    // Git invokes the hook without arguments: `pcg` alone runs the checks.
    match cli.command {
        Some(Commands::Run(args)) => Ok(commands::run(args)),
        Some(Commands::Init { force }) => commands::init(force),
        Some(Commands::Install { force }) => commands::install(force),
        Some(Commands::Uninstall) => commands::uninstall(),
        Some(Commands::Validate) => Ok(commands::validate()),
        Some(Commands::Config { raw }) => commands::config(raw),
        Some(Commands::Completions { shell }) => {
            commands::completions(shell);
            Ok(ExitCode::SUCCESS)
        },
        None => Ok(commands::run(RunArgs::default())),
    }
}

/// Sets up logging based on verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up color output.
fn setup_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        },
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        },
        ColorChoice::Auto => {},
    }
}
