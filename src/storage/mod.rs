//! Persistence backends.
//!
//! Stored containers talk to their backend only through [`StorageAdapter`]:
//! three asynchronous calls addressed by string key. The adapters here cover
//! in-process use and tests ([`MemoryStorage`]), durable local state
//! ([`FileStorage`]) and key namespacing ([`Namespaced`]).

mod adapter;
mod config;
mod file;
mod memory;

pub use adapter::{Namespaced, StorageAdapter};
pub use config::{Backend, StorageConfig};
pub use file::FileStorage;
pub use memory::MemoryStorage;
