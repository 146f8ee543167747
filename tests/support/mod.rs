//! Storage adapters for driving containers through edge cases.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stashcan::{MemoryStorage, StorageAdapter, StorageError};
use tokio::sync::Semaphore;

/// Let every queued background task run to completion.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Backend whose reads take a snapshot immediately but only answer once
/// released, like a slow server returning data that may be stale by then.
#[derive(Clone)]
pub struct GatedStorage {
    pub inner: MemoryStorage,
    gate: Arc<Semaphore>,
    resolved: Arc<AtomicUsize>,
}

impl GatedStorage {
    pub fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
            resolved: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Let `reads` pending reads answer.
    pub fn release(&self, reads: usize) {
        self.gate.add_permits(reads);
    }

    /// Number of reads that have answered.
    pub fn resolved(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageAdapter for GatedStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let snapshot = self.inner.get(key).await?;
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| StorageError::Unavailable)?;
        permit.forget();
        self.resolved.fetch_add(1, Ordering::SeqCst);
        Ok(snapshot)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

/// A storage call as seen by [`RecordingStorage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Set(String, String),
    Remove(String),
}

/// Backend that records every write and removal in issue order.
#[derive(Clone, Default)]
pub struct RecordingStorage {
    pub inner: MemoryStorage,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sets(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Set(key, value) => Some((key, value)),
                Call::Remove(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl StorageAdapter for RecordingStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Set(key.to_string(), value.to_string()));
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Remove(key.to_string()));
        self.inner.remove(key).await
    }
}

/// Backend that is always offline.
pub struct OfflineStorage;

#[async_trait]
impl StorageAdapter for OfflineStorage {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Backend("offline".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("offline".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("offline".to_string()))
    }
}
