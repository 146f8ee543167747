//! Stored containers.
//!
//! Two variants share one load cycle:
//! - [`StoredState`] holds a value that is replaced directly.
//! - [`StoredReducer`] holds a value that only moves through dispatched
//!   actions.
//!
//! Both start empty or at their default, issue one read when activated, and
//! write every later change through to storage without waiting for it.

mod action;
mod container;
mod reducer;
mod value;

pub use action::{Action, ActionKind, RESERVED_LOAD};
pub use reducer::{Reducer, StoredReducer};
pub use value::StoredState;
