//! Core functionality for precommit-gate.
//!
//! This module contains the building blocks the hook is made of:
//! - [`error`]: Error types and result handling
//! - [`executor`]: Subprocess execution
//! - [`git`]: Git repository operations

pub mod error;
pub mod executor;
pub mod git;
