// src/exec/local.rs

//! Runs shell commands on the orchestrator host.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Local command-execution facility shared through the execution context.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    shell: String,
    shell_flag: String,
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalExecutor {
    /// Executor using the platform shell (`sh -c` or `cmd /C`).
    pub fn new() -> Self {
        if cfg!(windows) {
            Self::with_shell("cmd", "/C")
        } else {
            Self::with_shell("sh", "-c")
        }
    }

    pub fn with_shell(shell: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            shell_flag: flag.into(),
        }
    }

    /// Run `cmd` to completion and return its output.
    ///
    /// Fails if the command cannot be spawned, exits non-zero, or `cancel`
    /// fires first (the child is killed in that case).
    pub async fn exec(&self, cmd: &str, cancel: &CancellationToken) -> Result<CommandOutput> {
        debug!(cmd = %cmd, "running local command");

        let child = Command::new(&self.shell)
            .arg(&self.shell_flag)
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning local command `{cmd}`"))?;

        // Dropping the wait future on cancellation drops the child, which kills it.
        let output = tokio::select! {
            out = child.wait_with_output() => {
                out.with_context(|| format!("waiting for local command `{cmd}`"))?
            }
            _ = cancel.cancelled() => {
                info!(cmd = %cmd, "cancellation requested; killed local command");
                bail!("local command `{cmd}` cancelled");
            }
        };

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            bail!(
                "local command `{}` exited with code {}: {}",
                cmd,
                result.exit_code,
                result.stderr.trim()
            );
        }

        debug!(cmd = %cmd, exit_code = result.exit_code, "local command finished");
        Ok(result)
    }
}
