//! CLI command implementations.

use super::RunArgs;
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::core::error::{Error, Result};
use crate::core::git::GitRepo;
use crate::hook::gate::Gate;
use crate::hook::{Hook, Outcome};
use console::style;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Hook script template.
const HOOK_SCRIPT: &str = r#"#!/bin/sh
# precommit-gate hook - installed by `pcg install`

# Skip if PCG_SKIP is set
if [ "$PCG_SKIP" = "1" ]; then
    exit 0
fi

exec pcg run
"#;

/// Hook marker comment.
const HOOK_MARKER: &str = "# precommit-gate hook";

/// Returns true when an environment switch is set to `1` or `true`.
fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

/// Run the hook. Every failure is reported here and becomes exit code 1.
pub fn run(args: RunArgs) -> ExitCode {
    match run_hook(args) {
        Ok(Outcome::Skipped) => {
            eprintln!("{} Skipping pre-commit checks", style("•").cyan());
            ExitCode::SUCCESS
        },
        Ok(Outcome::Passed { lint, duration }) => {
            eprintln!(
                "{} All checks passed ({} file(s) linted) in {:.1?}",
                style("✓").green().bold(),
                lint.linted,
                duration
            );
            ExitCode::SUCCESS
        },
        Err(Error::Interrupted) => {
            eprintln!();
            eprintln!("{} Interrupted. Commit aborted.", style("✗").red().bold());
            ExitCode::FAILURE
        },
        Err(e) => {
            eprintln!();
            eprintln!("{} {e}", style("✗").red().bold());
            eprintln!("  {}", e.hint_or_default());
            eprintln!("{}", style("Commit aborted.").red());
            ExitCode::FAILURE
        },
    }
}

fn run_hook(args: RunArgs) -> Result<Outcome> {
    let mut config = Config::load_or_default()?;
    if args.no_lint {
        config.lint.enabled = false;
    }
    if args.stash {
        config.stash.enabled = true;
    }
    if args.no_stash {
        config.stash.enabled = false;
    }

    let skip = env_flag("PCG_SKIP");
    let prompt = config.gate.prompt && !args.no_prompt && !env_flag("PCG_NO_PROMPT");
    let gate = Gate::new(skip, prompt);

    let repo = GitRepo::discover()?;
    let hook = Hook::new(config, repo);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal {
            message: format!("Failed to create runtime: {e}"),
        })?;

    let result = runtime.block_on(hook.run(gate));
    // The prompt reader may still be blocked on the terminal after Ctrl-C.
    runtime.shutdown_background();
    result
}

/// Initialize configuration.
pub fn init(force: bool) -> Result<ExitCode> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        eprintln!(
            "{} Configuration already exists: {}",
            style("!").yellow(),
            config_path.display()
        );
        eprintln!("  Use --force to overwrite.");
        return Ok(ExitCode::FAILURE);
    }

    let toml = toml::to_string_pretty(&Config::default()).map_err(|e| Error::Internal {
        message: format!("Failed to serialize config: {e}"),
    })?;

    std::fs::write(&config_path, toml).map_err(|e| Error::io("write config", e))?;

    eprintln!("{} Created {}", style("✓").green(), config_path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Review the lint table and test command in {CONFIG_FILE_NAME}");
    eprintln!("  2. Run: pcg install");

    Ok(ExitCode::SUCCESS)
}

/// Install git hook.
pub fn install(force: bool) -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let hooks_dir = repo.hooks_dir();
    let hook_path = hooks_dir.join("pre-commit");

    if !hooks_dir.exists() {
        std::fs::create_dir_all(&hooks_dir).map_err(|e| Error::io("create hooks dir", e))?;
    }

    if hook_path.exists() {
        let content =
            std::fs::read_to_string(&hook_path).map_err(|e| Error::io("read existing hook", e))?;

        if content.contains(HOOK_MARKER) {
            eprintln!(
                "{} Hook already installed at {}",
                style("✓").green(),
                hook_path.display()
            );
            return Ok(ExitCode::SUCCESS);
        }

        if !force && !confirm_replace(&hook_path)? {
            return Err(Error::HookExists { path: hook_path });
        }

        let backup_path = hooks_dir.join("pre-commit.bak");
        std::fs::rename(&hook_path, &backup_path).map_err(|e| Error::io("backup hook", e))?;
        eprintln!(
            "{} Backed up existing hook to {}",
            style("•").cyan(),
            backup_path.display()
        );
    }

    std::fs::write(&hook_path, HOOK_SCRIPT).map_err(|e| Error::io("write hook", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&hook_path)
            .map_err(|e| Error::io("get hook metadata", e))?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&hook_path, perms).map_err(|e| Error::io("set hook perms", e))?;
    }

    eprintln!(
        "{} Installed pre-commit hook at {}",
        style("✓").green(),
        hook_path.display()
    );

    Ok(ExitCode::SUCCESS)
}

/// Asks before replacing a foreign hook. Never asks without a terminal.
fn confirm_replace(hook_path: &std::path::Path) -> Result<bool> {
    if !std::io::stdin().is_terminal() || !std::io::stderr().is_terminal() {
        return Ok(false);
    }

    dialoguer::Confirm::new()
        .with_prompt(format!(
            "{} exists and was not installed by pcg. Back it up and replace it?",
            hook_path.display()
        ))
        .default(false)
        .interact()
        .map_err(|e| Error::Internal {
            message: format!("Prompt failed: {e}"),
        })
}

/// Uninstall git hook.
pub fn uninstall() -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let hook_path = repo.hook_path("pre-commit");

    if !hook_path.exists() {
        eprintln!(
            "{} No hook installed at {}",
            style("•").cyan(),
            hook_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let content = std::fs::read_to_string(&hook_path).map_err(|e| Error::io("read hook", e))?;

    if !content.contains(HOOK_MARKER) {
        eprintln!(
            "{} Hook at {} was not installed by precommit-gate",
            style("!").yellow(),
            hook_path.display()
        );
        eprintln!("  Remove manually if desired.");
        return Ok(ExitCode::FAILURE);
    }

    std::fs::remove_file(&hook_path).map_err(|e| Error::io("remove hook", e))?;

    eprintln!(
        "{} Removed pre-commit hook from {}",
        style("✓").green(),
        hook_path.display()
    );

    let backup_path = repo.hooks_dir().join("pre-commit.bak");
    if backup_path.exists() {
        eprintln!(
            "  Backup exists at {} - restore if needed",
            backup_path.display()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Validate configuration.
pub fn validate() -> ExitCode {
    match Config::load() {
        Ok(_) => {
            eprintln!("{} Configuration is valid", style("✓").green());
            ExitCode::SUCCESS
        },
        Err(Error::ConfigNotFound { path }) => {
            eprintln!(
                "{} Configuration not found: {}",
                style("!").yellow(),
                path.display()
            );
            eprintln!("  Run: pcg init");
            ExitCode::FAILURE
        },
        Err(e) => {
            eprintln!("{} Configuration validation failed: {e}", style("✗").red());
            ExitCode::FAILURE
        },
    }
}

/// Show configuration.
pub fn config(raw: bool) -> Result<ExitCode> {
    match Config::find_config_file() {
        Ok(path) => {
            eprintln!("Configuration file: {}", path.display());

            if raw {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io("read config", e))?;
                eprintln!();
                std::io::stdout()
                    .write_all(content.as_bytes())
                    .map_err(|e| Error::io("write output", e))?;
            }

            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { .. }) => {
            eprintln!(
                "{} No configuration file found, using defaults",
                style("!").yellow()
            );
            if raw {
                std::io::stdout()
                    .write_all(Config::default_toml().as_bytes())
                    .map_err(|e| Error::io("write output", e))?;
            } else {
                eprintln!("  Run: pcg init");
            }
            Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e),
    }
}

/// Generate shell completions.
pub fn completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    clap_complete::generate(
        shell,
        &mut super::Cli::command(),
        "pcg",
        &mut std::io::stdout(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_script_carries_marker() {
        assert!(HOOK_SCRIPT.starts_with("#!/bin/sh"));
        assert!(HOOK_SCRIPT.contains(HOOK_MARKER));
        assert!(HOOK_SCRIPT.contains("exec pcg run"));
    }

    #[test]
    fn test_env_flag_unset() {
        assert!(!env_flag("PCG_TEST_DEFINITELY_UNSET_12345"));
    }
}
