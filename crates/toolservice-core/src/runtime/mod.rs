//! External process execution
//!
//! This module provides:
//! - `CommandSpec` / `CommandResult` value types
//! - The `CommandExecutor` seam used by the template service
//! - `ProcessExecutor`, the tokio-backed implementation with timeouts

pub mod process;

pub use process::{CommandError, CommandExecutor, CommandResult, CommandSpec, ProcessExecutor};
