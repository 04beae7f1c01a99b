//! Shared utilities: subprocess execution and filesystem helpers.

pub mod fs;
pub mod process;

pub use process::{ExecRunner, ProcessBuilder, ProcessRunner};
