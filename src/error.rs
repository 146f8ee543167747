//! Error types.
//!
//! Storage adapters report failures through [`StorageError`]. Everything the
//! stores themselves can return is a [`StoreError`], which wraps adapter
//! failures together with encoding and lifecycle misuse.

use std::io;

/// Errors reported by a [`StorageAdapter`](crate::storage::StorageAdapter).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backend rejected the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend cannot be reached at the moment.
    #[error("storage unavailable")]
    Unavailable,
}

/// Errors returned by [`StoredState`](crate::StoredState) and
/// [`StoredReducer`](crate::StoredReducer).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage adapter failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The value could not be encoded for persistence.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    /// A consumer dispatched an action using the reserved `"load"` type.
    #[error("action type {0:?} is reserved for internal use")]
    ReservedAction(String),

    /// `activate` was called on a store that has already been activated.
    #[error("store is already active")]
    AlreadyActive,

    /// No tokio runtime was available to run background work.
    #[error("no async runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// A background persistence task panicked or was cancelled.
    #[error("persistence task failed: {0}")]
    TaskFailed(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
