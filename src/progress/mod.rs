// src/progress/mod.rs

//! Durable deployment progress.
//!
//! A [`DeploymentProgress`] records which tasks of a deployment have started
//! and completed. The runner persists it after every transition so that an
//! interrupted deployment can be resumed, skipping completed tasks.
//!
//! - [`render`] turns the current state into human-readable progress lines.

pub mod render;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

pub use render::{bar_fill, format_duration, percentage, BAR_WIDTH};

/// Default progress file name inside the working directory.
pub const DEFAULT_PROGRESS_FILE: &str = "deployment_progress.json";

/// Progress of a single task.
///
/// `end_time` is set if and only if `completed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgressRecord {
    pub task_id: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub completed_steps: u32,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Aggregate progress for one deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProgress {
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_tasks: usize,
    #[serde(default)]
    pub completed_tasks: usize,
    /// Name of the task currently executing; display only.
    #[serde(default)]
    pub current_task: String,
    /// Keyed by task ID; sorted so the file diffs cleanly between saves.
    #[serde(default)]
    pub task_progress: BTreeMap<String, TaskProgressRecord>,
}

impl Default for DeploymentProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl DeploymentProgress {
    /// Fresh progress starting now, with no tasks recorded.
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            total_tasks: 0,
            completed_tasks: 0,
            current_task: String::new(),
            task_progress: BTreeMap::new(),
        }
    }

    /// Whether the task with this ID has a completed record.
    pub fn is_completed(&self, task_id: &str) -> bool {
        self.task_progress
            .get(task_id)
            .is_some_and(|record| record.completed)
    }

    /// Create or overwrite the record for `task_id` as started, not completed.
    pub fn mark_started(&mut self, task_id: &str, name: &str, now: DateTime<Utc>) {
        if self.is_completed(task_id) {
            // Re-running a completed task: it no longer counts until it finishes again.
            self.completed_tasks = self.completed_tasks.saturating_sub(1);
        }
        self.task_progress.insert(
            task_id.to_string(),
            TaskProgressRecord {
                task_id: task_id.to_string(),
                name: name.to_string(),
                completed: false,
                total_steps: 0,
                completed_steps: 0,
                start_time: now,
                end_time: None,
            },
        );
    }

    /// Mark a started task as completed and bump `completed_tasks`.
    ///
    /// Returns `false` (and changes nothing) if the task was never started or
    /// is already completed.
    pub fn mark_completed(&mut self, task_id: &str, now: DateTime<Utc>) -> bool {
        match self.task_progress.get_mut(task_id) {
            Some(record) if !record.completed => {
                record.completed = true;
                record.end_time = Some(now.max(record.start_time));
                self.completed_tasks += 1;
                true
            }
            _ => false,
        }
    }

    /// Make every record satisfy "`end_time` is set iff `completed`".
    ///
    /// A record claiming completion without an end time is not trusted and
    /// reverts to not completed, so the task runs again on resume. An end
    /// time on an incomplete record (e.g. a zero timestamp) is dropped.
    fn normalize_records(&mut self) {
        for record in self.task_progress.values_mut() {
            match (record.completed, record.end_time) {
                (true, None) => {
                    warn!(
                        task = %record.task_id,
                        "progress record marked completed without an end time; will run again"
                    );
                    record.completed = false;
                }
                (false, Some(_)) => record.end_time = None,
                _ => {}
            }
        }
    }

    /// Number of records with `completed == true`.
    pub fn completed_records(&self) -> usize {
        self.task_progress.values().filter(|r| r.completed).count()
    }

    /// Serialize to pretty JSON and atomically write it to `path`.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        self.persist_with(&RealFileSystem, path)
    }

    pub fn persist_with(&self, fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_vec_pretty(self)?;
        fs.write_atomic(path, &data)?;
        debug!(path = ?path, completed = self.completed_tasks, "saved deployment progress");
        Ok(())
    }

    /// Load progress from `path`.
    ///
    /// A missing file is not an error: it means there was no prior run, and
    /// a fresh progress is returned.
    pub fn restore(path: impl AsRef<Path>) -> Result<Self> {
        Self::restore_with(&RealFileSystem, path)
    }

    pub fn restore_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !fs.exists(path) {
            debug!(path = ?path, "no progress file found; starting fresh");
            return Ok(Self::new());
        }

        let data = fs.read_to_string(path)?;
        let mut progress: DeploymentProgress = serde_json::from_str(&data)?;
        progress.normalize_records();

        let completed = progress.completed_records();
        if progress.completed_tasks != completed {
            warn!(
                path = ?path,
                recorded = progress.completed_tasks,
                actual = completed,
                "progress file completed count disagrees with task records; using task records"
            );
            progress.completed_tasks = completed;
        }

        Ok(progress)
    }
}
