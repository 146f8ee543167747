//! # Stashcan
//!
//! Reactive state containers whose value is mirrored to an asynchronous
//! key-value store.
//!
//! A container reads and writes like ordinary in-memory state, while every
//! change is written through to storage in the background so the value
//! survives restarts.
//!
//! ## Containers
//!
//! - `StoredState<T>` - a single value with direct replace and clear
//! - `StoredReducer<S, A>` - a single value moved only by dispatched actions
//!
//! On activation a container issues one read for its key. Until that read
//! resolves `loaded()` is false and the value is the default (if any); after
//! it resolves the value is whatever was stored, or the default. Later writes
//! update memory synchronously and persist without blocking the caller.
//!
//! ## Storage
//!
//! Backends implement [`StorageAdapter`]: async `get`/`set`/`remove` by key.
//! [`MemoryStorage`] and [`FileStorage`] ship with the crate, and
//! [`StorageConfig`] builds either from configuration.
//!
//! ```
//! use std::sync::Arc;
//! use stashcan::{MemoryStorage, StoredState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> stashcan::Result<()> {
//! let storage = Arc::new(MemoryStorage::new());
//!
//! let cart = StoredState::open(storage.clone(), "cart", Some(Vec::<String>::new()))?;
//! cart.wait_loaded().await;
//! cart.write(vec!["apple".to_string()])?.wait().await?;
//!
//! let reopened = StoredState::<Vec<String>>::open(storage, "cart", Some(Vec::new()))?;
//! assert!(reopened.wait_loaded().await);
//! assert_eq!(reopened.value(), Some(vec!["apple".to_string()]));
//! # Ok(())
//! # }
//! ```

pub mod cell;
pub mod codec;
pub mod error;
pub mod lifecycle;
pub mod persist;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use cell::{StateCell, Subscription};
pub use error::{Result, StorageError, StoreError};
pub use lifecycle::{Phase, Status};
pub use persist::{Operation, PersistHandle, PersistReport, StoreOptions};
pub use storage::{FileStorage, MemoryStorage, Namespaced, StorageAdapter, StorageConfig};
pub use store::{Action, ActionKind, Reducer, StoredReducer, StoredState, RESERVED_LOAD};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn it_works() {
        // Basic smoke test
        let storage = MemoryStorage::new();
        let state = StoredState::open(Arc::new(storage.clone()), "answer", Some(0)).unwrap();
        assert_eq!(state.value(), Some(0));

        assert!(state.wait_loaded().await);
        state.write(42).unwrap().wait().await.unwrap();
        assert_eq!(state.value(), Some(42));
        assert_eq!(storage.raw("answer").as_deref(), Some("42"));
    }
}
