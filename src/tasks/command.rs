// src/tasks/command.rs

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, Span};

use crate::config::TaskConfig;
use crate::context::ExecutionContext;
use crate::task::{Task, TaskFuture};

/// Runs a shell command through the context's local executor.
///
/// If `output_key` is set, the command's trimmed stdout is stored under that
/// runtime key for later tasks.
#[derive(Debug)]
pub struct CommandTask {
    name: String,
    cmd: String,
    output_key: Option<String>,
    ctx: Option<Arc<ExecutionContext>>,
    span: Span,
}

impl CommandTask {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            output_key: None,
            ctx: None,
            span: Span::none(),
        }
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn from_config(cfg: &TaskConfig) -> Self {
        let task = Self::new(&cfg.name, &cfg.cmd);
        match cfg.output_key {
            Some(ref key) => task.with_output_key(key),
            None => task,
        }
    }

    async fn execute(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let ctx = self
            .ctx
            .as_ref()
            .with_context(|| format!("task {} was not initialized", self.name))?;

        let output = ctx.local_executor.exec(&self.cmd, &cancel).await?;
        if let Some(ref key) = self.output_key {
            let value = output.stdout.trim().to_string();
            info!(parent: &self.span, key = %key, bytes = value.len(), "stored command output");
            ctx.store(key.clone(), value);
        }
        Ok(())
    }
}

impl Task for CommandTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: Arc<ExecutionContext>, span: Span) {
        self.ctx = Some(ctx);
        self.span = span;
    }

    fn run(&self, cancel: CancellationToken) -> TaskFuture<'_> {
        Box::pin(self.execute(cancel))
    }
}
