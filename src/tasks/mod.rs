// src/tasks/mod.rs

//! Concrete tasks built from configuration.

pub mod command;

pub use command::CommandTask;

use crate::config::ConfigFile;
use crate::task::Task;

/// Build the ordered task list from `[[task]]` entries.
pub fn from_config(cfg: &ConfigFile) -> Vec<Box<dyn Task>> {
    cfg.task
        .iter()
        .map(|t| Box::new(CommandTask::from_config(t)) as Box<dyn Task>)
        .collect()
}
