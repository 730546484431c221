use std::any::Any;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail};
use tokio_util::sync::CancellationToken;
use tracing::{info, Span};

use fleetdeploy::context::ExecutionContext;
use fleetdeploy::task::{Task, TaskFuture};

/// Shared, ordered log of task events (`init:<name>`, `run:<name>`).
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Entries of `log` that start with `prefix`, with the prefix stripped.
pub fn entries(log: &ExecutionLog, prefix: &str) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
        .collect()
}

type StoreFn = Box<dyn Fn(&ExecutionContext) + Send + Sync>;

enum Behaviour {
    Succeed,
    Fail(String),
    WaitForCancel,
}

/// A fake task that:
/// - records `init:<name>` and `run:<name>` into a shared log
/// - checks that the runner set `current_task` to its name before running
/// - then succeeds, fails with a fixed message, or blocks until cancelled.
pub struct FakeTask {
    name: String,
    behaviour: Behaviour,
    log: ExecutionLog,
    writes: Vec<StoreFn>,
    ctx: Option<Arc<ExecutionContext>>,
    span: Span,
}

impl FakeTask {
    fn with_behaviour(name: &str, behaviour: Behaviour, log: &ExecutionLog) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            log: Arc::clone(log),
            writes: Vec::new(),
            ctx: None,
            span: Span::none(),
        }
    }

    pub fn succeed(name: &str, log: &ExecutionLog) -> Self {
        Self::with_behaviour(name, Behaviour::Succeed, log)
    }

    pub fn fail(name: &str, message: &str, log: &ExecutionLog) -> Self {
        Self::with_behaviour(name, Behaviour::Fail(message.to_string()), log)
    }

    pub fn wait_for_cancel(name: &str, log: &ExecutionLog) -> Self {
        Self::with_behaviour(name, Behaviour::WaitForCancel, log)
    }

    /// Store `value` under `key` in the runtime store when run.
    pub fn storing<T>(mut self, key: &str, value: T) -> Self
    where
        T: Any + Send + Sync + Clone,
    {
        let key = key.to_string();
        self.writes
            .push(Box::new(move |ctx: &ExecutionContext| {
                ctx.store(key.clone(), value.clone())
            }));
        self
    }

    pub fn boxed(self) -> Box<dyn Task> {
        Box::new(self)
    }

    async fn execute(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("run:{}", self.name));
        info!(parent: &self.span, "fake task running");

        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| anyhow!("fake task {} not initialized", self.name))?;

        let current = ctx.progress().current_task;
        if current != self.name {
            bail!("current_task was {current:?} while running {}", self.name);
        }

        for write in self.writes.iter() {
            write(ctx);
        }

        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail(ref msg) => Err(anyhow!(msg.clone())),
            Behaviour::WaitForCancel => {
                cancel.cancelled().await;
                bail!("cancelled")
            }
        }
    }
}

impl Task for FakeTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: Arc<ExecutionContext>, span: Span) {
        self.log.lock().unwrap().push(format!("init:{}", self.name));
        self.ctx = Some(ctx);
        self.span = span;
    }

    fn run(&self, cancel: CancellationToken) -> TaskFuture<'_> {
        Box::pin(self.execute(cancel))
    }
}
