//! # precommit-gate
//!
//! A git pre-commit hook that lints the files you changed and runs your test
//! suite inside the active virtual environment, aborting the commit when
//! either fails.
//!
//! ## Features
//!
//! - **Interactive skip**: answer `s` on the terminal to let a commit through
//! - **Per-extension linting**: a table maps file extensions to lint tools,
//!   with per-tool exit codes that count as a pass
//! - **Isolated test runs**: optionally stash unstaged work so tests see only
//!   what is being committed, and restore it afterwards
//!
//! ## Example
//!
//! ```rust,no_run
//! use precommit_gate::hook::gate::Gate;
//! use precommit_gate::{Config, GitRepo, Hook, Outcome};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> precommit_gate::Result<()> {
//!     let config = Config::load_or_default()?;
//!     let hook = Hook::new(config, GitRepo::discover()?);
//!
//!     match hook.run(Gate::Terminal).await? {
//!         Outcome::Skipped => println!("skipped"),
//!         Outcome::Passed { .. } => println!("passed"),
//!     }
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/precommit-gate/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cli;
pub mod config;
pub mod core;
pub mod hook;

// Re-export main types for convenience
pub use config::Config;
pub use core::error::{Error, Result};
pub use core::git::GitRepo;
pub use hook::{Hook, Outcome};
