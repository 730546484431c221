// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DeployError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DeployError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run all semantic checks on a raw config.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_nodes(cfg)?;
    validate_services(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn validate_nodes(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for node in cfg.nodes.iter() {
        if node.name.trim().is_empty() {
            return Err(DeployError::ConfigError(format!(
                "node with host '{}' has an empty name",
                node.host
            )));
        }
        if node.host.trim().is_empty() {
            return Err(DeployError::ConfigError(format!(
                "node '{}' has an empty host",
                node.name
            )));
        }
        if !seen.insert(node.name.as_str()) {
            return Err(DeployError::ConfigError(format!(
                "duplicate node name '{}'",
                node.name
            )));
        }
    }
    Ok(())
}

fn validate_services(cfg: &RawConfigFile) -> Result<()> {
    for (service, svc) in cfg.services.iter() {
        for node in svc.nodes.iter() {
            if !cfg.nodes.iter().any(|n| &n.name == node) {
                return Err(DeployError::ConfigError(format!(
                    "service '{}' references unknown node '{}'",
                    service, node
                )));
            }
        }
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for task in cfg.task.iter() {
        if task.name.trim().is_empty() {
            return Err(DeployError::ConfigError(
                "[[task]] entries must have a non-empty name".to_string(),
            ));
        }
        // Task names double as progress-file identities.
        if !seen.insert(task.name.as_str()) {
            return Err(DeployError::ConfigError(format!(
                "duplicate task name '{}'",
                task.name
            )));
        }
    }
    Ok(())
}
