//! Error types for the replay buffer
//!
//! Every failure is local to the operation that caused it. None of these are
//! fatal: the controller always has Stopped as a recovery state.

use thiserror::Error;

use crate::capture::CaptureError;
use crate::replay::{Command, Mode};

/// Replay-wide error type
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Segment creation failed: {0}")]
    SegmentCreationFailed(#[source] CaptureError),

    #[error("Recorded segment produced no data")]
    EmptyArtifact,

    #[error("No active segment to save")]
    EmptyWindow,

    #[error("Failed to finalize segment: {0}")]
    FinalizeFailed(#[source] CaptureError),

    #[error("Cannot {command} while {mode}")]
    InvalidCommand { command: Command, mode: Mode },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Replay service is not running")]
    ServiceStopped,

    #[error("Replay service gave an unexpected reply to {0}")]
    UnexpectedReply(Command),
}

impl ReplayError {
    /// Stable machine-readable code for API consumers
    pub fn code(&self) -> &'static str {
        match self {
            ReplayError::CaptureUnavailable(_) => "CAPTURE_UNAVAILABLE",
            ReplayError::PermissionDenied(_) => "PERMISSION_DENIED",
            ReplayError::SegmentCreationFailed(_) => "SEGMENT_CREATION_FAILED",
            ReplayError::EmptyArtifact => "EMPTY_ARTIFACT",
            ReplayError::EmptyWindow => "EMPTY_WINDOW",
            ReplayError::FinalizeFailed(_) => "FINALIZE_FAILED",
            ReplayError::InvalidCommand { .. } => "INVALID_COMMAND",
            ReplayError::Config(_) => "CONFIG_ERROR",
            ReplayError::ServiceStopped => "SERVICE_STOPPED",
            ReplayError::UnexpectedReply(_) => "UNEXPECTED_REPLY",
        }
    }

    /// Maps an acquisition failure onto the start-time error taxonomy
    pub fn from_acquire(error: CaptureError) -> Self {
        match error {
            CaptureError::PermissionDenied(msg) => ReplayError::PermissionDenied(msg),
            CaptureError::Unavailable(msg) => ReplayError::CaptureUnavailable(msg),
            other => ReplayError::CaptureUnavailable(other.to_string()),
        }
    }
}

/// Result type alias using ReplayError
pub type ReplayResult<T> = Result<T, ReplayError>;
