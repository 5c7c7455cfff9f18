pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod output;
pub mod replay;
pub mod service;

pub use capture::{
    CaptureError, CaptureKind, CaptureSession, CaptureSource, CaptureSourceFactory, Chunk,
    SegmentEncoder, SyntheticCapture, SyntheticConfig,
};
pub use config::Config;
pub use error::{ReplayError, ReplayResult};
pub use http::{create_router, AppState};
pub use output::{Artifact, ArtifactSink, OutputAssembler, SavedReplay};
pub use replay::{
    Command, Mode, ReplayConfig, ReplayController, ReplayEvent, ReplayStatus, SegmentWindow,
};
pub use service::{CommandOutcome, ReplayHandle, ReplayService};
