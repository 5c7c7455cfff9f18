//! Capture collaborators
//!
//! The replay core only talks to these traits. Acquiring a source, encoding
//! frames and revoking access all live behind them.

pub mod backend;
pub mod synthetic;

pub use backend::{
    AcquireFailure, CaptureError, CaptureKind, CaptureSession, CaptureSource,
    CaptureSourceFactory, Chunk, DisabledCapture, EndSignal, Revoker, SegmentEncoder,
};
pub use synthetic::{SyntheticCapture, SyntheticConfig, SyntheticEncoder, SyntheticSession};
