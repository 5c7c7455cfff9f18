//! Replay service
//!
//! Runs a `ReplayController` on its own task and exposes it through a
//! cloneable `ReplayHandle`:
//! - commands go over an mpsc channel with a oneshot reply
//! - status is published on a watch channel after every step
//! - controller events are re-broadcast to subscribers

mod handle;
mod runner;

pub use handle::{CommandOutcome, ReplayHandle};
pub use runner::ReplayService;
