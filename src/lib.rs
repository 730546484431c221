// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod net;
pub mod progress;
pub mod runner;
pub mod task;
pub mod tasks;
pub mod types;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::runner::{resolve_progress_file, Runner};

pub use crate::context::{ExecutionContext, RuntimeKey, RuntimeStore};
pub use crate::errors::DeployError;
pub use crate::progress::{DeploymentProgress, TaskProgressRecord};
pub use crate::task::{Task, TaskFuture};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - task construction from `[[task]]` entries
/// - runner initialization (context, progress, local node)
/// - Ctrl-C handling via a cancellation token
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_and_validate(&args.config)?;
    apply_cli_overrides(&mut cfg, &args);

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let local_node = net::detect_local_node(cfg.nodes.clone()).await;
    let tasks = tasks::from_config(&cfg);
    let mut runner = Runner::new(cfg, tasks).with_local_node(local_node);
    runner.initialize()?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("interrupt received; cancelling current task");
            cancel.cancel();
        });
    }

    runner.run(cancel).await?;
    Ok(())
}

/// CLI flags win over values from the config file.
pub fn apply_cli_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if args.resume {
        cfg.deployment.resume_enabled = true;
    }
    if args.no_resume {
        cfg.deployment.resume_enabled = false;
    }
    if let Some(ref path) = args.progress_file {
        cfg.deployment.progress_file_path = Some(path.clone());
    }
}

/// Print nodes, services and the ordered task list.
fn print_dry_run(cfg: &ConfigFile) {
    println!("fleetdeploy dry-run: cluster '{}'", cfg.name);
    println!("  work_dir = {}", cfg.work_dir.display());
    println!("  resume_enabled = {}", cfg.deployment.resume_enabled);
    println!("  progress_file = {}", resolve_progress_file(cfg).display());
    println!();

    println!("nodes ({}):", cfg.nodes.len());
    for node in cfg.nodes.iter() {
        match node.username {
            Some(ref user) => println!("  - {} ({}@{})", node.name, user, node.host),
            None => println!("  - {} ({})", node.name, node.host),
        }
    }

    if !cfg.services.is_empty() {
        println!("services:");
        for (name, svc) in cfg.services.iter() {
            println!("  - {name}: {:?}", svc.nodes);
        }
    }

    println!("tasks ({}):", cfg.task.len());
    for (i, task) in cfg.task.iter().enumerate() {
        println!("  {}. {}", i + 1, task.name);
        println!("      cmd: {}", task.cmd);
        if let Some(ref key) = task.output_key {
            println!("      output_key: {key}");
        }
    }

    debug!("dry-run complete (no execution)");
}
