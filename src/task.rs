// src/task.rs

//! The unit of deployment work driven by the runner.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::context::ExecutionContext;

/// Boxed future returned by [`Task::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// A deployment task.
///
/// The runner calls [`Task::init`] once, in registration order, before any
/// task runs; then [`Task::run`] at most once per deployment attempt.
pub trait Task: Send + Sync {
    /// Stable identity, unique within a run. Also used as the progress-file key.
    fn name(&self) -> &str;

    /// Receive the shared context and a tracing span scoped to this task.
    fn init(&mut self, ctx: Arc<ExecutionContext>, span: Span);

    /// Perform the task. The cancellation token is the one passed to
    /// [`crate::runner::Runner::run`], unmodified.
    fn run(&self, cancel: CancellationToken) -> TaskFuture<'_>;
}
