use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::container::Container;
use crate::cell::Subscription;
use crate::codec;
use crate::error::Result;
use crate::lifecycle::{Phase, Status};
use crate::persist::{PersistHandle, StoreOptions};
use crate::storage::StorageAdapter;

/// A single value kept in memory and mirrored to storage under one key.
///
/// Reads are synchronous. [`write`](Self::write) updates the in-memory value
/// immediately and persists it in the background; [`remove`](Self::remove)
/// clears both. Handles are cheap to clone and share one container; dropping
/// the last handle tears it down.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stashcan::{MemoryStorage, StoredState};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> stashcan::Result<()> {
/// let storage = Arc::new(MemoryStorage::new());
///
/// let theme = StoredState::open(storage.clone(), "theme", Some("light".to_string()))?;
/// assert_eq!(theme.value().as_deref(), Some("light"));
/// assert!(!theme.loaded());
///
/// theme.wait_loaded().await;
/// theme.write("dark".to_string())?.wait().await?;
///
/// let reopened = StoredState::<String>::open(storage, "theme", None)?;
/// reopened.wait_loaded().await;
/// assert_eq!(reopened.value().as_deref(), Some("dark"));
/// # Ok(())
/// # }
/// ```
pub struct StoredState<T> {
    container: Arc<Container<T>>,
}

impl<T> StoredState<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a container bound to `key` without loading anything yet.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        key: impl Into<String>,
        default: Option<T>,
    ) -> Result<Self> {
        Self::with_options(storage, key, default, StoreOptions::default())
    }

    /// Like [`new`](Self::new), with a report channel or other options.
    pub fn with_options(
        storage: Arc<dyn StorageAdapter>,
        key: impl Into<String>,
        default: Option<T>,
        options: StoreOptions,
    ) -> Result<Self> {
        let container = Container::new(
            storage,
            key.into(),
            default,
            options,
            Box::new(|state: &mut Option<T>, loaded: T| *state = Some(loaded)),
        )?;
        Ok(Self { container })
    }

    /// Create a container and immediately start loading.
    pub fn open(
        storage: Arc<dyn StorageAdapter>,
        key: impl Into<String>,
        default: Option<T>,
    ) -> Result<Self> {
        Self::open_with(storage, key, default, StoreOptions::default())
    }

    pub fn open_with(
        storage: Arc<dyn StorageAdapter>,
        key: impl Into<String>,
        default: Option<T>,
        options: StoreOptions,
    ) -> Result<Self> {
        let store = Self::with_options(storage, key, default, options)?;
        store.activate()?;
        Ok(store)
    }

    /// Issue the initial read. Valid exactly once per container.
    pub fn activate(&self) -> Result<()> {
        self.container.activate()
    }

    /// The current value.
    ///
    /// `None` until a default is supplied or a stored value loads, and after
    /// [`remove`](Self::remove).
    pub fn value(&self) -> Option<T> {
        self.container.cell().get()
    }

    /// Read the value without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<&T>) -> R,
    {
        self.container.cell().with(f)
    }

    /// Replace the value and persist it in the background.
    ///
    /// The new value is visible to readers before this returns. If `value`
    /// cannot be encoded, nothing changes and the encoding error is returned.
    /// Storage failures never roll the in-memory value back.
    pub fn write(&self, value: T) -> Result<PersistHandle> {
        let raw = codec::encode(&value)?;
        self.container.touch();
        self.container.cell().set(Some(value));
        Ok(self.container.persist(raw))
    }

    /// Clear the value and delete the backing entry in the background.
    pub fn remove(&self) -> PersistHandle {
        self.container.touch();
        self.container.cell().set(None);
        self.container.remove_entry()
    }

    /// Whether the initial read for the current key has resolved.
    pub fn loaded(&self) -> bool {
        self.container.status().loaded
    }

    /// Wait until the initial read resolves or the container is torn down.
    ///
    /// Returns the final `loaded` flag.
    pub async fn wait_loaded(&self) -> bool {
        self.container.wait_loaded().await
    }

    pub fn phase(&self) -> Phase {
        self.container.status().phase
    }

    pub fn status(&self) -> Status {
        self.container.status()
    }

    pub fn key(&self) -> String {
        self.container.key()
    }

    /// Rebind to another key, starting a fresh load cycle.
    ///
    /// The value resets to the default and `loaded` drops to false until the
    /// new key's read resolves.
    pub fn set_key(&self, key: impl Into<String>) {
        self.container.set_key(key.into());
    }

    /// Tear down. A read still in flight is discarded when it resolves.
    pub fn deactivate(&self) {
        self.container.deactivate();
    }

    /// Call `callback` after every change to the in-memory value.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&T>) + Send + Sync + 'static,
    {
        self.container.cell().subscribe(callback)
    }
}

impl<T> Clone for StoredState<T> {
    fn clone(&self) -> Self {
        Self {
            container: Arc::clone(&self.container),
        }
    }
}
