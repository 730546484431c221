// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `fleetdeploy`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fleetdeploy",
    version,
    about = "Run ordered deployment tasks against a storage cluster, resuming after interruption.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Skip tasks the progress file records as completed.
    ///
    /// Overrides `[deployment].resume_enabled`.
    #[arg(long, conflicts_with = "no_resume")]
    pub resume: bool,

    /// Start a fresh deployment even if the config enables resume.
    #[arg(long)]
    pub no_resume: bool,

    /// Progress file location (overrides `[deployment].progress_file_path`).
    #[arg(long, value_name = "PATH")]
    pub progress_file: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLEETDEPLOY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't execute any tasks.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
