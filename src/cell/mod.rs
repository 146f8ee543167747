//! Reactive in-memory state.
//!
//! A [`StateCell`] is the in-memory half of every stored container: reads are
//! synchronous, and every change is pushed to subscribers so a consumer can
//! re-render when the value moves.

mod cell;

pub use cell::{StateCell, Subscription};
