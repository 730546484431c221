// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An operation was invoked in the wrong lifecycle phase.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A context value was read back as a different type than it was stored with.
    #[error("Type mismatch for runtime key '{key}': expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("run task {task}: {source:#}")]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeployError {
    /// Name of the failing task, if this error came out of a task run.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            DeployError::TaskFailed { task, .. } => Some(task),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DeployError>;
