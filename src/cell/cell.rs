use std::sync::{Arc, PoisonError, RwLock, Weak};

type Subscriber<T> = Arc<dyn Fn(Option<&T>) + Send + Sync>;

struct Subscribers<T> {
    next_id: usize,
    entries: Vec<(usize, Subscriber<T>)>,
}

/// A thread-safe reactive slot holding an optional value.
///
/// `None` is the "nothing here yet" state: before a default is supplied, or
/// after the value has been removed. Subscribers are called after every change
/// with a snapshot of the new value, outside of any internal lock, so they may
/// read the cell again.
pub struct StateCell<T> {
    state: Arc<RwLock<Option<T>>>,
    subscribers: Arc<RwLock<Subscribers<T>>>,
}

impl<T: Clone + Send + Sync + 'static> StateCell<T> {
    /// Create a new cell with the given initial value.
    pub fn new(initial: Option<T>) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
            subscribers: Arc::new(RwLock::new(Subscribers {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> Option<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the value with a function without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<&T>) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(state.as_ref())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: Option<T>) {
        self.set_quiet(value);
        self.notify();
    }

    /// Update the value in place and notify subscribers.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Option<T>) -> R,
    {
        let result = self.update_quiet(f);
        self.notify();
        result
    }

    /// Subscribe to changes.
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&T>) + Send + Sync + 'static,
    {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push((id, Arc::new(callback)));

        let registry: Arc<dyn Unsubscribe> = self.subscribers.clone();
        Subscription {
            id,
            registry: Arc::downgrade(&registry),
        }
    }

    pub(crate) fn set_quiet(&self, value: Option<T>) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub(crate) fn update_quiet<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Option<T>) -> R,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Notify all subscribers with a snapshot of the current value.
    pub(crate) fn notify(&self) {
        let snapshot = self.get();
        let subscribers: Vec<Subscriber<T>> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        for subscriber in subscribers {
            subscriber(snapshot.as_ref());
        }
    }
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: usize);
}

impl<T> Unsubscribe for RwLock<Subscribers<T>> {
    fn unsubscribe(&self, id: usize) {
        let mut subscribers = self.write().unwrap_or_else(PoisonError::into_inner);
        subscribers.entries.retain(|(entry, _)| *entry != id);
    }
}

/// RAII guard for a cell subscription.
pub struct Subscription {
    id: usize,
    registry: Weak<dyn Unsubscribe>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}
