#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fleetdeploy::config::{
    ConfigFile, DeploymentSection, Node, RawConfigFile, ServiceConfig, TaskConfig, UiSection,
};
use fleetdeploy::types::{HighlightColor, ProgressStyle};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                name: "test-cluster".to_string(),
                work_dir: PathBuf::from("."),
                deployment: DeploymentSection::default(),
                ui: UiSection {
                    show_progress: true,
                    progress_style: ProgressStyle::Bar,
                    task_info_color: HighlightColor::None,
                },
                nodes: Vec::new(),
                services: BTreeMap::new(),
                task: Vec::new(),
            },
        }
    }

    pub fn work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.work_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn resume(mut self, enabled: bool) -> Self {
        self.config.deployment.resume_enabled = enabled;
        self
    }

    pub fn progress_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config.deployment.progress_file_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.ui.show_progress = show;
        self
    }

    pub fn progress_style(mut self, style: ProgressStyle) -> Self {
        self.config.ui.progress_style = style;
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.config.nodes.push(node);
        self
    }

    pub fn with_service(mut self, name: &str, nodes: &[&str]) -> Self {
        self.config.services.insert(
            name.to_string(),
            ServiceConfig {
                nodes: nodes.iter().map(|n| n.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_task(mut self, name: &str, cmd: &str) -> Self {
        self.config.task.push(TaskConfig {
            name: name.to_string(),
            cmd: cmd.to_string(),
            output_key: None,
        });
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `Node`.
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    pub fn new(name: &str, host: &str) -> Self {
        Self {
            node: Node {
                name: name.to_string(),
                host: host.to_string(),
                username: None,
            },
        }
    }

    pub fn username(mut self, user: &str) -> Self {
        self.node.username = Some(user.to_string());
        self
    }

    pub fn build(self) -> Node {
        self.node
    }
}
