//! Fire-and-forget persistence.
//!
//! Every write and removal runs on its own detached task. Callers get a
//! [`PersistHandle`] they may await or drop; failures are logged and, when a
//! report channel is configured, published as [`PersistReport`]s. The
//! in-memory value is never rolled back.

mod persist;

pub use persist::{Operation, PersistHandle, PersistReport, StoreOptions};
pub(crate) use persist::Persister;
