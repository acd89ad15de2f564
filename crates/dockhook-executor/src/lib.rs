//! Command execution backends for dockhook.

pub mod process;

pub use process::ProcessRunner;
