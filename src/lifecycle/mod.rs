//! Load-cycle bookkeeping shared by every stored container.
//!
//! ```text
//! Uninitialized --activate--> Loading --read resolved--> Ready
//!       |                        |                          |
//!       +-------- deactivate ----+------------------------> Deactivated
//! ```
//!
//! A key change from `Loading` or `Ready` starts a new activation, which is
//! treated as a fresh instance: `loaded` drops back to false until the read for
//! the new key resolves.

mod activation;

pub use activation::{Activation, Phase, Status};
