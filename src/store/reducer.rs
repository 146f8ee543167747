use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::action::ActionKind;
use super::container::Container;
use crate::cell::Subscription;
use crate::codec;
use crate::error::{Result, StoreError};
use crate::lifecycle::{Phase, Status};
use crate::persist::{PersistHandle, StoreOptions};
use crate::storage::StorageAdapter;

/// Pure state transition for a [`StoredReducer`].
///
/// `state` is `None` when nothing has been loaded and no default was given.
/// Returning `None` leaves the store empty and skips persistence.
///
/// `reduce` runs without any lock on the store's value held, so it may read
/// the store it belongs to. Dispatching into that same store from inside
/// `reduce` deadlocks.
pub trait Reducer<S, A>: Send + Sync + 'static {
    fn reduce(&self, state: Option<&S>, action: A) -> Option<S>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(Option<&S>, A) -> Option<S> + Send + Sync + 'static,
{
    fn reduce(&self, state: Option<&S>, action: A) -> Option<S> {
        self(state, action)
    }
}

/// Everything that can move reducer state.
///
/// Loads never travel through the consumer's action type, so `reduce` cannot
/// observe one and a consumer cannot forge one.
enum Message<S, A> {
    External(A),
    LoadCompleted(S),
}

fn transition<S: 'static, A: 'static>(
    reducer: &dyn Reducer<S, A>,
    state: Option<&S>,
    message: Message<S, A>,
) -> Option<S> {
    match message {
        Message::LoadCompleted(loaded) => Some(loaded),
        Message::External(action) => reducer.reduce(state, action),
    }
}

/// A value mutated only through dispatched actions and mirrored to storage.
///
/// Every dispatched action that produces a state is written through. Unlike
/// [`StoredState::remove`](crate::StoredState::remove), [`remove`](Self::remove)
/// only deletes the backing entry and keeps the in-memory state.
///
/// Seeding never persists. When the initial read resolves, the stored value
/// or the default becomes the state without passing through the reducer and
/// without being written back; the first write for a key comes from the
/// first dispatch that produces a state.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stashcan::{Action, MemoryStorage, StoredReducer};
///
/// fn counter(state: Option<&i64>, action: Action) -> Option<i64> {
///     let current = state.copied().unwrap_or(0);
///     match action.kind.as_str() {
///         "inc" => Some(current + action.payload_as::<i64>().unwrap_or(1)),
///         "reset" => Some(0),
///         _ => Some(current),
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> stashcan::Result<()> {
/// let storage = Arc::new(MemoryStorage::new());
/// let count = StoredReducer::open(storage.clone(), "counter", counter, Some(0))?;
/// count.wait_loaded().await;
///
/// if let Some(write) = count.dispatch(Action::new("inc", 5))? {
///     write.wait().await?;
/// }
/// assert_eq!(count.value(), Some(5));
/// assert_eq!(storage.raw("counter").as_deref(), Some("5"));
/// # Ok(())
/// # }
/// ```
pub struct StoredReducer<S, A> {
    container: Arc<Container<S>>,
    reducer: Arc<dyn Reducer<S, A>>,
    dispatching: Arc<Mutex<()>>,
}

impl<S, A> StoredReducer<S, A>
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    A: ActionKind + 'static,
{
    /// Create a container bound to `key` without loading anything yet.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new<R>(
        storage: Arc<dyn StorageAdapter>,
        key: impl Into<String>,
        reducer: R,
        default: Option<S>,
    ) -> Result<Self>
    where
        R: Reducer<S, A>,
    {
        Self::with_options(storage, key, reducer, default, StoreOptions::default())
    }

    pub fn with_options<R>(
        storage: Arc<dyn StorageAdapter>,
        key: impl Into<String>,
        reducer: R,
        default: Option<S>,
        options: StoreOptions,
    ) -> Result<Self>
    where
        R: Reducer<S, A>,
    {
        let reducer: Arc<dyn Reducer<S, A>> = Arc::new(reducer);
        let seed_reducer = Arc::clone(&reducer);
        let container = Container::new(
            storage,
            key.into(),
            default,
            options,
            Box::new(move |state: &mut Option<S>, loaded: S| {
                let next = transition(&*seed_reducer, state.as_ref(), Message::LoadCompleted(loaded));
                *state = next;
            }),
        )?;
        Ok(Self {
            container,
            reducer,
            dispatching: Arc::new(Mutex::new(())),
        })
    }

    /// Create a container and immediately start loading.
    pub fn open<R>(
        storage: Arc<dyn StorageAdapter>,
        key: impl Into<String>,
        reducer: R,
        default: Option<S>,
    ) -> Result<Self>
    where
        R: Reducer<S, A>,
    {
        Self::open_with(storage, key, reducer, default, StoreOptions::default())
    }

    pub fn open_with<R>(
        storage: Arc<dyn StorageAdapter>,
        key: impl Into<String>,
        reducer: R,
        default: Option<S>,
        options: StoreOptions,
    ) -> Result<Self>
    where
        R: Reducer<S, A>,
    {
        let store = Self::with_options(storage, key, reducer, default, options)?;
        store.activate()?;
        Ok(store)
    }

    /// Issue the initial read. Valid exactly once per container.
    pub fn activate(&self) -> Result<()> {
        self.container.activate()
    }

    pub fn value(&self) -> Option<S> {
        self.container.cell().get()
    }

    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<&S>) -> R,
    {
        self.container.cell().with(f)
    }

    /// Run `action` through the reducer and persist the result.
    ///
    /// The new state is visible before this returns. Returns `Ok(None)` when
    /// the reducer produced no state, in which case nothing is persisted.
    /// Actions of the reserved `"load"` type are rejected without touching
    /// state. If the new state cannot be encoded it is kept in memory and the
    /// encoding error is returned.
    ///
    /// Dispatches through clones of one store run one at a time.
    pub fn dispatch(&self, action: A) -> Result<Option<PersistHandle>> {
        if action.is_reserved() {
            let kind = action.kind().to_string();
            tracing::error!(
                key = self.container.key().as_str(),
                kind = kind.as_str(),
                "rejected dispatch of reserved action type"
            );
            return Err(StoreError::ReservedAction(kind));
        }

        let _serial = self
            .dispatching
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.container.touch();
        let current = self.container.cell().get();
        let next = transition(&*self.reducer, current.as_ref(), Message::External(action));
        self.container.cell().set(next.clone());

        match next {
            Some(state) => {
                let raw = codec::encode(&state)?;
                Ok(Some(self.container.persist(raw)))
            }
            None => Ok(None),
        }
    }

    /// Delete the backing entry in the background. In-memory state is kept.
    pub fn remove(&self) -> PersistHandle {
        self.container.remove_entry()
    }

    /// Whether the initial read for the current key has resolved.
    pub fn loaded(&self) -> bool {
        self.container.status().loaded
    }

    /// Wait until the initial read resolves or the container is torn down.
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

    /// Rebind to another key, starting a fresh load cycle from the default.
    pub fn set_key(&self, key: impl Into<String>) {
        self.container.set_key(key.into());
    }

    pub fn deactivate(&self) {
        self.container.deactivate();
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&S>) + Send + Sync + 'static,
    {
        self.container.cell().subscribe(callback)
    }
}

impl<S, A> Clone for StoredReducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            container: Arc::clone(&self.container),
            reducer: Arc::clone(&self.reducer),
            dispatching: Arc::clone(&self.dispatching),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Action;

    fn add(state: Option<&i64>, action: Action) -> Option<i64> {
        Some(state.copied().unwrap_or(0) + action.payload_as::<i64>().unwrap_or(0))
    }

    #[test]
    fn load_message_bypasses_reducer() {
        let next = transition::<i64, Action>(&add, Some(&3), Message::LoadCompleted(40));
        assert_eq!(next, Some(40));
    }

    #[test]
    fn external_message_routes_through_reducer() {
        let next = transition::<i64, Action>(&add, Some(&3), Message::External(Action::new("inc", 4)));
        assert_eq!(next, Some(7));

        let from_empty = transition::<i64, Action>(&add, None, Message::External(Action::new("inc", 4)));
        assert_eq!(from_empty, Some(4));
    }
}
