use crate::output::ArtifactSink;
use crate::service::ReplayHandle;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle to the replay service
    pub replay: ReplayHandle,

    /// Where saved replays are written
    pub sink: Arc<ArtifactSink>,
}

impl AppState {
    pub fn new(replay: ReplayHandle, sink: ArtifactSink) -> Self {
        Self {
            replay,
            sink: Arc::new(sink),
        }
    }
}
