use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::cell::StateCell;
use crate::codec;
use crate::error::{Result, StorageError, StoreError};
use crate::lifecycle::{Activation, Phase, Status};
use crate::persist::{PersistHandle, Persister, StoreOptions};
use crate::storage::StorageAdapter;

/// Applies a freshly loaded value to the in-memory state.
pub(crate) type Seed<T> = Box<dyn Fn(&mut Option<T>, T) + Send + Sync>;

struct Lifecycle {
    key: String,
    activation: Option<Activation>,
    generation: u64,
}

/// Load-cycle plumbing shared by the value and reducer stores.
///
/// All lifecycle transitions happen under the `lifecycle` lock, so a load
/// result either lands before a deactivation or key change, or is discarded.
pub(crate) struct Container<T> {
    cell: StateCell<T>,
    default: Option<T>,
    persister: Persister,
    lifecycle: Mutex<Lifecycle>,
    status: watch::Sender<Status>,
    seed: Seed<T>,
}

impl<T> Container<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        storage: Arc<dyn StorageAdapter>,
        key: String,
        default: Option<T>,
        options: StoreOptions,
        seed: Seed<T>,
    ) -> Result<Arc<Self>> {
        let persister = Persister::new(storage, options)?;
        let (status, _) = watch::channel(Status::new());

        Ok(Arc::new(Self {
            cell: StateCell::new(default.clone()),
            default,
            persister,
            lifecycle: Mutex::new(Lifecycle {
                key,
                activation: None,
                generation: 0,
            }),
            status,
            seed,
        }))
    }

    pub(crate) fn cell(&self) -> &StateCell<T> {
        &self.cell
    }

    pub(crate) fn key(&self) -> String {
        self.lock().key.clone()
    }

    pub(crate) fn status(&self) -> Status {
        *self.status.borrow()
    }

    /// Start the first load cycle.
    pub(crate) fn activate(self: &Arc<Self>) -> Result<()> {
        let mut lifecycle = self.lock();
        if self.status().phase != Phase::Uninitialized {
            return Err(StoreError::AlreadyActive);
        }
        self.start_cycle(&mut lifecycle);
        Ok(())
    }

    /// Tear down: pending reads are discarded when they resolve.
    pub(crate) fn deactivate(&self) {
        let mut lifecycle = self.lock();
        if let Some(activation) = lifecycle.activation.take() {
            activation.cancel();
        }
        self.status.send_if_modified(|status| {
            let changed = status.phase != Phase::Deactivated;
            status.phase = Phase::Deactivated;
            changed
        });
        tracing::debug!(key = lifecycle.key.as_str(), "store deactivated");
    }

    /// Rebind to `key`. An active container starts over with a new load
    /// cycle; the old cycle's read is discarded when it resolves.
    pub(crate) fn set_key(self: &Arc<Self>, key: String) {
        let mut lifecycle = self.lock();
        if lifecycle.key == key {
            return;
        }
        lifecycle.key = key;

        match self.status().phase {
            Phase::Uninitialized | Phase::Deactivated => {}
            Phase::Loading | Phase::Ready => {
                if let Some(activation) = lifecycle.activation.take() {
                    activation.cancel();
                }
                self.cell.set_quiet(self.default.clone());
                self.start_cycle(&mut lifecycle);
                drop(lifecycle);
                self.cell.notify();
            }
        }
    }

    pub(crate) async fn wait_loaded(&self) -> bool {
        let mut status = self.status.subscribe();
        let loaded = match status.wait_for(Status::is_settled).await {
            Ok(settled) => settled.loaded,
            Err(_) => false,
        };
        loaded
    }

    /// Record a local change. A change made while the initial read is in
    /// flight wins over whatever that read returns.
    pub(crate) fn touch(&self) {
        let lifecycle = self.lock();
        if self.status().phase == Phase::Loading {
            if let Some(activation) = &lifecycle.activation {
                activation.mark_dirty();
            }
        }
    }

    pub(crate) fn persist(&self, raw: String) -> PersistHandle {
        self.persister.set(self.key(), raw)
    }

    pub(crate) fn remove_entry(&self) -> PersistHandle {
        self.persister.remove(self.key())
    }

    fn start_cycle(self: &Arc<Self>, lifecycle: &mut Lifecycle) {
        lifecycle.generation += 1;
        let activation = Activation::new(lifecycle.generation);
        lifecycle.activation = Some(activation.clone());
        self.status.send_replace(Status::loading());

        tracing::debug!(
            key = lifecycle.key.as_str(),
            generation = lifecycle.generation,
            "loading stored value"
        );
        self.spawn_load(lifecycle.key.clone(), activation);
    }

    fn spawn_load(self: &Arc<Self>, key: String, activation: Activation) {
        let container = Arc::downgrade(self);
        let storage = self.persister.storage();

        // The task holds only a weak reference so dropping every store handle
        // still tears the container down while the read is outstanding.
        self.persister.runtime().spawn(async move {
            let outcome = storage.get(&key).await;
            match container.upgrade() {
                Some(container) => container.finish_load(&key, &activation, outcome),
                None => tracing::debug!(key = key.as_str(), "store dropped before load resolved"),
            }
        });
    }

    fn finish_load(
        &self,
        key: &str,
        activation: &Activation,
        outcome: Result<Option<String>, StorageError>,
    ) {
        let lifecycle = self.lock();
        if !activation.is_live() {
            tracing::debug!(
                key,
                generation = activation.generation(),
                "discarding stale load"
            );
            return;
        }

        let stored = match outcome {
            Ok(Some(raw)) => match codec::decode::<T>(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(key, error = %e, "stored value is malformed; using default");
                    self.persister.report_load_failure(key, e.to_string());
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value; using default");
                self.persister.report_load_failure(key, e.to_string());
                None
            }
        };

        let seeded = !activation.is_dirty();
        if seeded {
            if let Some(value) = stored.or_else(|| self.default.clone()) {
                self.cell.update_quiet(|state| (self.seed)(state, value));
            }
        }
        self.status.send_replace(Status::ready());
        tracing::debug!(key, seeded, "stored value loaded");
        drop(lifecycle);

        self.cell.notify();
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for Container<T> {
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(activation) = lifecycle.activation.take() {
            activation.cancel();
        }
    }
}
