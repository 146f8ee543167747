use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where a container is in its load cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Created but never activated.
    Uninitialized,
    /// The initial read is in flight.
    Loading,
    /// The initial read has resolved.
    Ready,
    /// Torn down. Pending reads are discarded when they arrive.
    Deactivated,
}

/// Snapshot of a container's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    pub phase: Phase,
    /// Set once the initial read of the current activation resolves.
    pub loaded: bool,
}

impl Status {
    pub(crate) const fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            loaded: false,
        }
    }

    pub(crate) const fn loading() -> Self {
        Self {
            phase: Phase::Loading,
            loaded: false,
        }
    }

    pub(crate) const fn ready() -> Self {
        Self {
            phase: Phase::Ready,
            loaded: true,
        }
    }

    /// Whether waiting on this container can still change anything.
    pub(crate) const fn is_settled(&self) -> bool {
        self.loaded || matches!(self.phase, Phase::Deactivated)
    }
}

/// Liveness token for one activation of a container on one key.
///
/// The load task captures a clone when it issues its read and checks it when
/// the read resolves. Once cancelled, a token never becomes live again, so a
/// read issued for an abandoned key or a torn-down container cannot touch
/// state.
#[derive(Clone, Debug)]
pub struct Activation {
    inner: Arc<Flags>,
    generation: u64,
}

#[derive(Debug)]
struct Flags {
    live: AtomicBool,
    dirty: AtomicBool,
}

impl Activation {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            inner: Arc::new(Flags {
                live: AtomicBool::new(true),
                dirty: AtomicBool::new(false),
            }),
            generation,
        }
    }

    /// Sequence number of this activation within its container.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the activation is still current.
    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel(&self) {
        self.inner.live.store(false, Ordering::SeqCst);
    }

    /// Record that the value changed locally while the load was in flight.
    pub(crate) fn mark_dirty(&self) {
        self.inner.dirty.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }
}
