//! Core types shared by the dockhook crates.
//!
//! This crate contains:
//! - The `CommandRunner` capability every pipeline stage and probe goes through
//! - Command output and error types
//! - A scripted runner for tests (`test-util` feature)

pub mod command;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use command::{CommandOutput, CommandRunner};
pub use error::{CommandError, CommandResult};
