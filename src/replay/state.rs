//! Replay state machine types
//!
//! Modes, commands, status snapshots and the events published to observers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current mode of the replay controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// No capture session, no segments
    #[default]
    Stopped,
    /// Capture acquired, waiting for the countdown to finish
    CountingDown,
    /// Segments are recording and rotating
    Recording,
    /// Every segment is paused
    Paused,
    /// Finalizing the target segment
    Saving,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Stopped => "stopped",
            Mode::CountingDown => "counting down",
            Mode::Recording => "recording",
            Mode::Paused => "paused",
            Mode::Saving => "saving",
        };
        f.write_str(name)
    }
}

/// Commands accepted from the UI collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    Start,
    Pause,
    Resume,
    ToggleLoop,
    Save,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::ToggleLoop => "toggle loop",
            Command::Save => "save",
        };
        f.write_str(name)
    }
}

/// Snapshot of the controller for the UI collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStatus {
    pub mode: Mode,
    pub countdown_remaining: u32,
    pub looping_enabled: bool,
    pub recording_elapsed_seconds: u64,
    pub window_length: usize,
    pub window_capacity: usize,
}

/// Events emitted by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayEvent {
    ModeChanged { mode: Mode },
    Countdown { remaining: u32 },
    SegmentStarted { segment_id: u64, window_length: usize },
    SegmentEvicted { segment_id: u64 },
    SegmentCreationFailed { error: String },
    LoopToggled { enabled: bool, window_length: usize },
    StartFailed { error: String },
    CaptureEnded,
    Saved { filename: String, bytes: usize },
    SaveFailed { error: String },
}
