// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{HighlightColor, ProgressStyle};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// name = "prod"
/// work_dir = "/var/lib/fleetdeploy"
///
/// [deployment]
/// resume_enabled = true
///
/// [ui]
/// progress_style = "bar"
/// task_info_color = "cyan"
///
/// [[nodes]]
/// name = "storage-1"
/// host = "10.0.0.11"
///
/// [services.meta]
/// nodes = ["storage-1"]
///
/// [[task]]
/// name = "prepare-artifact"
/// cmd = "tar czf artifact.tgz bin/"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default = "default_cluster_name")]
    pub name: String,

    /// Directory used for temporary artifacts and the default progress file.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    #[serde(default)]
    pub deployment: DeploymentSection,

    #[serde(default)]
    pub ui: UiSection,

    #[serde(default)]
    pub nodes: Vec<Node>,

    /// Service topology keyed by service name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,

    /// Ordered deployment tasks from `[[task]]`.
    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub name: String,
    pub work_dir: PathBuf,
    pub deployment: DeploymentSection,
    pub ui: UiSection,
    pub nodes: Vec<Node>,
    pub services: BTreeMap<String, ServiceConfig>,
    pub task: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            name: raw.name,
            work_dir: raw.work_dir,
            deployment: raw.deployment,
            ui: raw.ui,
            nodes: raw.nodes,
            services: raw.services,
            task: raw.task,
        }
    }
}

fn default_cluster_name() -> String {
    "default".to_string()
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

/// `[deployment]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentSection {
    /// Skip tasks recorded as completed in the progress file.
    #[serde(default)]
    pub resume_enabled: bool,

    /// Explicit progress file location; defaults to
    /// `<work_dir>/deployment_progress.json`.
    #[serde(default)]
    pub progress_file_path: Option<PathBuf>,
}

/// `[ui]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct UiSection {
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,

    #[serde(default)]
    pub progress_style: ProgressStyle,

    #[serde(default)]
    pub task_info_color: HighlightColor,
}

fn default_show_progress() -> bool {
    true
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            show_progress: default_show_progress(),
            progress_style: ProgressStyle::default(),
            task_info_color: HighlightColor::default(),
        }
    }
}

/// A machine in the target node set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Node {
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// `[services.<name>]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Node names hosting this service.
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// `[[task]]` entry: a shell command run on the orchestrator host.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    pub cmd: String,

    /// Runtime key that receives the command's trimmed stdout.
    #[serde(default)]
    pub output_key: Option<String>,
}
