//! Main entry point for the `pcg` CLI.

use precommit_gate::cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_user_error() {
                eprintln!("  {}", e.hint_or_default());
            }
            ExitCode::FAILURE
        }
    }
}
