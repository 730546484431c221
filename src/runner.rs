// src/runner.rs

//! Sequential task runner with resumable progress.
//!
//! Per task the runner moves through:
//!
//! - `Pending -> Skipped` when resuming and the progress file already records
//!   the task as completed,
//! - `Pending -> Running -> Completed`,
//! - `Pending -> Running -> Failed`, which ends the whole run.
//!
//! The start marker is persisted before a task runs and the completion marker
//! after it returns successfully, so the progress file never claims a task
//! complete that did not finish. Persistence failures only cost resumability
//! and are logged, never returned.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument, Span};

use crate::config::{ConfigFile, Node};
use crate::context::ExecutionContext;
use crate::errors::{DeployError, Result};
use crate::exec::LocalExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::net;
use crate::progress::{DeploymentProgress, DEFAULT_PROGRESS_FILE};
use crate::task::Task;

/// How the runner learns which node is local.
#[derive(Debug, Clone)]
enum LocalNodeSource {
    Detect,
    Fixed(Option<Node>),
}

/// Drives registered tasks in order against a shared [`ExecutionContext`].
pub struct Runner {
    config: Arc<ConfigFile>,
    tasks: Vec<Box<dyn Task>>,
    spans: Vec<Span>,
    local_node: LocalNodeSource,
    fs: Arc<dyn FileSystem>,
    context: Option<Arc<ExecutionContext>>,
    progress_file: PathBuf,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.tasks.iter().map(|t| t.name()).collect();
        f.debug_struct("Runner")
            .field("tasks", &names)
            .field("initialized", &self.context.is_some())
            .field("progress_file", &self.progress_file)
            .finish_non_exhaustive()
    }
}

impl Runner {
    pub fn new(config: ConfigFile, tasks: Vec<Box<dyn Task>>) -> Self {
        let progress_file = resolve_progress_file(&config);
        Self {
            config: Arc::new(config),
            tasks,
            spans: Vec::new(),
            local_node: LocalNodeSource::Detect,
            fs: Arc::new(RealFileSystem),
            context: None,
            progress_file,
        }
    }

    /// Use `node` as the local node instead of detecting it from the
    /// machine's network identity.
    pub fn with_local_node(mut self, node: Option<Node>) -> Self {
        self.local_node = LocalNodeSource::Fixed(node);
        self
    }

    /// Persist and restore progress through `fs`.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Append tasks. Fails once the runner has been initialized.
    pub fn register<I>(&mut self, tasks: I) -> Result<()>
    where
        I: IntoIterator<Item = Box<dyn Task>>,
    {
        if self.context.is_some() {
            return Err(DeployError::Precondition(
                "runner has been initialized".to_string(),
            ));
        }
        self.tasks.extend(tasks);
        Ok(())
    }

    /// Build the execution context, attach progress (fresh or resumed) and
    /// call every task's init hook in registration order.
    ///
    /// Unless [`Runner::with_local_node`] was used, local node detection runs
    /// here and blocks; async callers should pass in the result of
    /// [`net::detect_local_node`] instead.
    pub fn initialize(&mut self) -> Result<()> {
        if self.context.is_some() {
            return Err(DeployError::Precondition(
                "runner has already been initialized".to_string(),
            ));
        }
        self.check_unique_names()?;

        let local_node = match self.local_node {
            LocalNodeSource::Detect => net::find_local_node(&self.config.nodes),
            LocalNodeSource::Fixed(ref node) => node.clone(),
        };
        match local_node {
            Some(ref node) => info!(node = %node.name, host = %node.host, "identified local node"),
            None => info!("no configured node matches this machine"),
        }

        self.progress_file = resolve_progress_file(&self.config);
        let mut progress = self.load_progress();
        progress.total_tasks = self.tasks.len();
        // A resumed deployment is in progress again.
        progress.end_time = None;

        let executor = Arc::new(LocalExecutor::new());
        let ctx = Arc::new(ExecutionContext::new(
            Arc::clone(&self.config),
            local_node,
            executor,
            progress,
        ));

        self.spans.clear();
        for task in self.tasks.iter_mut() {
            let span = info_span!("task", task = %task.name());
            task.init(Arc::clone(&ctx), span.clone());
            self.spans.push(span);
        }

        self.context = Some(ctx);
        Ok(())
    }

    /// Task names key the progress records, so they must be unique.
    fn check_unique_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for task in self.tasks.iter() {
            if !seen.insert(task.name()) {
                return Err(DeployError::Precondition(format!(
                    "duplicate task name '{}'",
                    task.name()
                )));
            }
        }
        Ok(())
    }

    fn load_progress(&self) -> DeploymentProgress {
        if !self.config.deployment.resume_enabled {
            return DeploymentProgress::new();
        }

        match DeploymentProgress::restore_with(self.fs.as_ref(), &self.progress_file) {
            Ok(progress) => {
                info!(
                    path = ?self.progress_file,
                    "Resuming deployment with {}/{} completed tasks",
                    progress.completed_tasks,
                    progress.total_tasks
                );
                progress
            }
            Err(err) => {
                warn!(
                    path = ?self.progress_file,
                    "Failed to load progress file: {err}, starting fresh deployment"
                );
                DeploymentProgress::new()
            }
        }
    }

    /// Store a value in the shared runtime store.
    ///
    /// Fails before [`Runner::initialize`] because the context does not exist yet.
    pub fn store<T>(&self, key: impl Into<String>, value: T) -> Result<()>
    where
        T: std::any::Any + Send + Sync,
    {
        let ctx = self.require_context("Runtime hasn't been initialized")?;
        ctx.store(key, value);
        Ok(())
    }

    /// The execution context, once initialized.
    pub fn context(&self) -> Option<&Arc<ExecutionContext>> {
        self.context.as_ref()
    }

    pub fn progress_file(&self) -> &Path {
        &self.progress_file
    }

    /// Snapshot of the current progress, once initialized.
    pub fn progress(&self) -> Option<DeploymentProgress> {
        self.context.as_ref().map(|ctx| ctx.progress())
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name())
    }

    fn require_context(&self, msg: &str) -> Result<&Arc<ExecutionContext>> {
        self.context
            .as_ref()
            .ok_or_else(|| DeployError::Precondition(msg.to_string()))
    }

    /// Run all tasks in registration order.
    ///
    /// Stops at the first failing task and returns
    /// [`DeployError::TaskFailed`] naming it. `cancel` is handed to every
    /// task as-is; a task failing because of cancellation is treated like any
    /// other failure.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let ctx = self.require_context("runner has not been initialized")?;
        let resume = self.config.deployment.resume_enabled;
        let ui = &self.config.ui;
        let total = self.tasks.len();

        for (i, task) in self.tasks.iter().enumerate() {
            let task_id = task.name().to_string();

            if resume && ctx.read_progress(|p| p.is_completed(&task_id)) {
                info!(task = %task_id, "Skipping completed task {} ({}/{})", task_id, i + 1, total);
                continue;
            }

            let line = ctx.update_progress(|p| {
                p.current_task = task_id.clone();
                if ui.show_progress {
                    p.render(i, &task_id, ui.progress_style, ui.task_info_color)
                } else {
                    ui.task_info_color
                        .paint(format!("Running task {task_id}"), true)
                }
            });
            info!("{line}");

            ctx.update_progress(|p| p.mark_started(&task_id, task.name(), Utc::now()));
            self.save_progress(ctx, "Failed to save progress");

            let span = self.spans.get(i).cloned().unwrap_or_else(Span::none);
            if let Err(err) = task.run(cancel.clone()).instrument(span).await {
                error!(task = %task_id, error = %format!("{err:#}"), "task failed");
                ctx.update_progress(|p| p.end_time = Some(Utc::now()));
                self.save_progress(ctx, "Failed to save progress");
                return Err(DeployError::TaskFailed {
                    task: task_id,
                    source: err,
                });
            }

            ctx.update_progress(|p| p.mark_completed(&task_id, Utc::now()));
            self.save_progress(ctx, "Failed to save progress");
        }

        let summary = ctx.update_progress(|p| {
            p.end_time = Some(Utc::now());
            ui.show_progress
                .then(|| p.render_completion(ui.task_info_color))
        });
        for line in summary.into_iter().flatten() {
            info!("{line}");
        }

        self.save_progress(ctx, "Failed to save final progress");
        Ok(())
    }

    /// Persist progress when resume is enabled; failures are logged only.
    fn save_progress(&self, ctx: &ExecutionContext, failure_msg: &str) {
        if !self.config.deployment.resume_enabled {
            return;
        }
        let result = ctx.read_progress(|p| p.persist_with(self.fs.as_ref(), &self.progress_file));
        if let Err(err) = result {
            warn!(path = ?self.progress_file, "{failure_msg}: {err}");
        }
    }
}

/// Explicit `[deployment].progress_file_path`, else
/// `<work_dir>/deployment_progress.json`.
pub fn resolve_progress_file(config: &ConfigFile) -> PathBuf {
    match config.deployment.progress_file_path {
        Some(ref path) if !path.as_os_str().is_empty() => path.clone(),
        _ => config.work_dir.join(DEFAULT_PROGRESS_FILE),
    }
}
