use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use super::StorageAdapter;
use crate::error::StorageError;

/// In-process storage backed by a shared hash map.
///
/// Clones share the same entries, so a test can keep one handle to inspect
/// what a store persisted through another.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronously read the raw value under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Synchronously store a raw value, bypassing any container.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.insert_raw(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_get_set_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("missing").await.unwrap(), None);

        storage.set("theme", "\"dark\"").await.unwrap();
        assert_eq!(storage.get("theme").await.unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(storage.len(), 1);

        storage.remove("theme").await.unwrap();
        storage.remove("theme").await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        other.set("k", "1").await.unwrap();
        assert_eq!(storage.raw("k").as_deref(), Some("1"));
    }
}
