// src/context.rs

//! Shared execution context handed to every task.
//!
//! The context combines:
//! - a concurrent, string-keyed [`RuntimeStore`] that tasks use to pass values
//!   to later tasks (artifact paths, tokens, generated config, ...),
//! - structured fields fixed at runner initialization (config, node
//!   inventory, service topology, working directory, local executor, local
//!   node),
//! - a read view of the deployment progress, which only the runner mutates.

use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{ConfigFile, Node, ServiceConfig};
use crate::errors::{DeployError, Result};
use crate::exec::LocalExecutor;
use crate::progress::DeploymentProgress;

/// A runtime key that carries the type of the value stored under it.
pub struct RuntimeKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RuntimeKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for RuntimeKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RuntimeKey<T> {}

impl<T> fmt::Debug for RuntimeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuntimeKey").field(&self.name).finish()
    }
}

/// Well-known runtime keys shared between deployment tasks.
pub mod keys {
    use std::path::PathBuf;

    use super::RuntimeKey;

    pub const ARTIFACT_TMP_DIR: RuntimeKey<PathBuf> = RuntimeKey::new("artifact/tmp_dir");
    pub const ARTIFACT_PATH: RuntimeKey<PathBuf> = RuntimeKey::new("artifact/path");
    pub const ARTIFACT_GZIP: RuntimeKey<bool> = RuntimeKey::new("artifact/gzip");
    pub const ARTIFACT_SHA256SUM: RuntimeKey<String> = RuntimeKey::new("artifact/sha256sum");
    pub const ARTIFACT_FILE_PATHS: RuntimeKey<Vec<PathBuf>> =
        RuntimeKey::new("artifact/file_paths");

    pub const CLICKHOUSE_TMP_DIR: RuntimeKey<PathBuf> = RuntimeKey::new("clickhouse/tmp_dir");
    pub const MONITOR_TMP_DIR: RuntimeKey<PathBuf> = RuntimeKey::new("monitor/tmp_dir");
    pub const CLUSTER_FILE_CONTENT: RuntimeKey<String> =
        RuntimeKey::new("cluster/cluster_file_content");
    pub const MGMT_SERVER_ADDRESSES: RuntimeKey<String> =
        RuntimeKey::new("mgmt/server_addresses");
    pub const USER_TOKEN: RuntimeKey<String> = RuntimeKey::new("user_token");
    pub const ADMIN_CLI_TOML: RuntimeKey<String> = RuntimeKey::new("admin_cli_toml");
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Concurrent string-keyed store of opaque values.
///
/// Each value is stored behind an `Arc`, so a read always observes one
/// complete write. Reading a key with a different type than it was written
/// with yields [`DeployError::TypeMismatch`].
#[derive(Default)]
pub struct RuntimeStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl fmt::Debug for RuntimeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<_> = entries.keys().collect();
        keys.sort();
        f.debug_struct("RuntimeStore").field("keys", &keys).finish()
    }
}

impl RuntimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), Arc::new(value));
    }

    /// Load a clone of the value under `key`.
    ///
    /// `Ok(None)` if the key is absent; `Err(TypeMismatch)` if it holds a
    /// value of another type.
    pub fn load<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<Option<T>> {
        let entry = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) => Arc::clone(entry),
                None => return Ok(None),
            }
        };

        match entry.downcast_ref::<T>() {
            Some(value) => Ok(Some(value.clone())),
            None => Err(DeployError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            }),
        }
    }

    pub fn set<T: Any + Send + Sync>(&self, key: RuntimeKey<T>, value: T) {
        self.store(key.name(), value);
    }

    pub fn get<T: Any + Send + Sync + Clone>(&self, key: RuntimeKey<T>) -> Result<Option<T>> {
        self.load(key.name())
    }

    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State shared by all tasks of one run.
///
/// Built by [`crate::runner::Runner::initialize`]; tasks receive an
/// `Arc<ExecutionContext>` in their init hook. The public fields are set once
/// and treated as read-only afterwards.
#[derive(Debug)]
pub struct ExecutionContext {
    pub config: Arc<ConfigFile>,
    /// Node inventory keyed by node name.
    pub nodes: BTreeMap<String, Node>,
    pub services: BTreeMap<String, ServiceConfig>,
    pub work_dir: PathBuf,
    pub local_executor: Arc<LocalExecutor>,
    /// The configured node matching the machine this process runs on.
    pub local_node: Option<Node>,
    runtime: RuntimeStore,
    progress: RwLock<DeploymentProgress>,
}

impl ExecutionContext {
    pub fn new(
        config: Arc<ConfigFile>,
        local_node: Option<Node>,
        local_executor: Arc<LocalExecutor>,
        progress: DeploymentProgress,
    ) -> Self {
        let nodes = config
            .nodes
            .iter()
            .map(|node| (node.name.clone(), node.clone()))
            .collect();

        Self {
            nodes,
            services: config.services.clone(),
            work_dir: config.work_dir.clone(),
            local_executor,
            local_node,
            config,
            runtime: RuntimeStore::new(),
            progress: RwLock::new(progress),
        }
    }

    pub fn runtime(&self) -> &RuntimeStore {
        &self.runtime
    }

    pub fn store<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.runtime.store(key, value);
    }

    pub fn load<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<Option<T>> {
        self.runtime.load(key)
    }

    pub fn set<T: Any + Send + Sync>(&self, key: RuntimeKey<T>, value: T) {
        self.runtime.set(key, value);
    }

    pub fn get<T: Any + Send + Sync + Clone>(&self, key: RuntimeKey<T>) -> Result<Option<T>> {
        self.runtime.get(key)
    }

    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Nodes hosting `service`, in configured order. Unknown services yield
    /// an empty list.
    pub fn service_nodes(&self, service: &str) -> Vec<&Node> {
        self.services
            .get(service)
            .map(|svc| svc.nodes.iter().filter_map(|n| self.nodes.get(n)).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the current deployment progress.
    pub fn progress(&self) -> DeploymentProgress {
        self.read_progress(|p| p.clone())
    }

    pub fn read_progress<R>(&self, f: impl FnOnce(&DeploymentProgress) -> R) -> R {
        let progress = self.progress.read().unwrap_or_else(PoisonError::into_inner);
        f(&progress)
    }

    pub(crate) fn update_progress<R>(&self, f: impl FnOnce(&mut DeploymentProgress) -> R) -> R {
        let mut progress = self.progress.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut progress)
    }
}
