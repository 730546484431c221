// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`local`] provides [`LocalExecutor`], the command-execution facility
//!   exposed to tasks through the execution context. It uses
//!   `tokio::process::Command` and honours a cancellation token.

pub mod local;

pub use local::{CommandOutput, LocalExecutor};
