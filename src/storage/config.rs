use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use super::{FileStorage, MemoryStorage, Namespaced, StorageAdapter};

/// Which backend to persist into.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum Backend {
    /// Entries live in process memory and vanish on exit.
    Memory,
    /// One file per key under `dir`.
    File { dir: PathBuf },
}

/// Deserializable storage configuration.
///
/// ```
/// use stashcan::storage::{Backend, StorageConfig};
///
/// let config: StorageConfig =
///     serde_json::from_str(r#"{"backend": "file", "dir": "/tmp/app", "namespace": "v1"}"#)
///         .unwrap();
/// assert_eq!(config.backend, Backend::File { dir: "/tmp/app".into() });
/// assert_eq!(config.namespace.as_deref(), Some("v1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub backend: Backend,
    /// Optional prefix applied to every key.
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            namespace: None,
        }
    }
}

impl StorageConfig {
    /// Build the configured adapter.
    pub fn build(&self) -> Arc<dyn StorageAdapter> {
        let adapter: Arc<dyn StorageAdapter> = match &self.backend {
            Backend::Memory => Arc::new(MemoryStorage::new()),
            Backend::File { dir } => Arc::new(FileStorage::new(dir.clone())),
        };

        match &self.namespace {
            Some(namespace) => Arc::new(Namespaced::new(adapter, namespace.clone())),
            None => adapter,
        }
    }
}
