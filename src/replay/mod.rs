//! Rolling replay buffer
//!
//! - `Segment`: one recording unit with its own lifecycle
//! - `SegmentWindow`: fixed-capacity sliding window of live segments
//! - `Scheduler`: named, restartable periodic timers
//! - `ReplayController`: the state machine tying them together

mod config;
mod controller;
mod scheduler;
mod segment;
mod state;
mod window;

pub use config::ReplayConfig;
pub use controller::ReplayController;
pub use scheduler::{Scheduler, TaskSlot, Tick};
pub use segment::{FinalizedSegment, Segment, SegmentState};
pub use state::{Command, Mode, ReplayEvent, ReplayStatus};
pub use window::{Rotation, SegmentWindow};
