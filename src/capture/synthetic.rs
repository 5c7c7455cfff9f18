// Synthetic capture backend
//
// Stands in for a real display/camera source. Encoders emit one fixed-size
// chunk per whole data interval spent recording, so output size tracks the
// footage a real encoder would have produced.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::backend::{
    AcquireFailure, CaptureError, CaptureSession, CaptureSource, Chunk, EndSignal, Revoker,
    SegmentEncoder,
};

/// Configuration for the synthetic source
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// How often an encoder delivers a chunk while recording
    pub data_interval: Duration,
    /// Bytes per delivered chunk
    pub chunk_size: usize,
    /// Fail every acquisition with this error
    pub fail_with: Option<AcquireFailure>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            data_interval: Duration::from_secs(1),
            chunk_size: 4096,
            fail_with: None,
        }
    }
}

/// Synthetic capture source
pub struct SyntheticCapture {
    config: SyntheticConfig,
    revoker: Revoker,
    sessions_acquired: usize,
}

impl SyntheticCapture {
    pub fn new(config: SyntheticConfig) -> Self {
        info!(
            "Synthetic capture initialized ({}ms data interval, {} byte chunks)",
            config.data_interval.as_millis(),
            config.chunk_size
        );

        Self {
            config,
            revoker: Revoker::new(),
            sessions_acquired: 0,
        }
    }

    /// Handle that simulates the user revoking the shared source
    pub fn revoker(&self) -> Revoker {
        self.revoker.clone()
    }

    pub fn sessions_acquired(&self) -> usize {
        self.sessions_acquired
    }
}

#[async_trait::async_trait]
impl CaptureSource for SyntheticCapture {
    async fn acquire(&mut self) -> Result<Box<dyn CaptureSession>, CaptureError> {
        match self.config.fail_with {
            Some(AcquireFailure::Unavailable) => {
                return Err(CaptureError::Unavailable(
                    "synthetic source configured as unavailable".to_string(),
                ))
            }
            Some(AcquireFailure::Denied) => {
                return Err(CaptureError::PermissionDenied(
                    "synthetic source configured to deny access".to_string(),
                ))
            }
            None => {}
        }

        self.sessions_acquired += 1;
        let session = SyntheticSession::new(self.config.clone(), self.revoker.subscribe());
        info!("Acquired synthetic capture session {}", session.id);

        Ok(Box::new(session))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Session handed out by [`SyntheticCapture`]
pub struct SyntheticSession {
    id: String,
    config: SyntheticConfig,
    end_signal: EndSignal,
    released: bool,
    encoders_created: u64,
}

impl SyntheticSession {
    fn new(config: SyntheticConfig, end_signal: EndSignal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            end_signal,
            released: false,
            encoders_created: 0,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSession for SyntheticSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn create_encoder(&mut self) -> Result<Box<dyn SegmentEncoder>, CaptureError> {
        if self.released {
            return Err(CaptureError::Released);
        }
        if self.end_signal.has_fired() {
            return Err(CaptureError::Unavailable("capture source was revoked".to_string()));
        }

        self.encoders_created += 1;
        Ok(Box::new(SyntheticEncoder::new(
            self.config.data_interval,
            self.config.chunk_size,
            self.encoders_created,
        )))
    }

    async fn ended(&mut self) {
        self.end_signal.wait().await;
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            info!("Released synthetic capture session {}", self.id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderState {
    Inactive,
    Recording,
    Paused,
    Finished,
}

/// Encoder that synthesizes chunks from its recorded duration
pub struct SyntheticEncoder {
    data_interval: Duration,
    chunk_size: usize,
    fill: u8,
    state: EncoderState,
    active_since: Option<Instant>,
    recorded: Duration,
}

impl SyntheticEncoder {
    pub fn new(data_interval: Duration, chunk_size: usize, serial: u64) -> Self {
        Self {
            data_interval,
            chunk_size,
            fill: (serial % 251) as u8,
            state: EncoderState::Inactive,
            active_since: None,
            recorded: Duration::ZERO,
        }
    }

    fn settle(&mut self, now: Instant) {
        if let Some(since) = self.active_since.take() {
            self.recorded += now.saturating_duration_since(since);
        }
    }
}

#[async_trait::async_trait]
impl SegmentEncoder for SyntheticEncoder {
    fn start(&mut self, now: Instant) -> Result<(), CaptureError> {
        if self.state != EncoderState::Inactive {
            return Err(CaptureError::Encoder("encoder already started".to_string()));
        }
        self.state = EncoderState::Recording;
        self.active_since = Some(now);
        Ok(())
    }

    fn pause(&mut self, now: Instant) {
        if self.state == EncoderState::Recording {
            self.settle(now);
            self.state = EncoderState::Paused;
        }
    }

    fn resume(&mut self, now: Instant) {
        if self.state == EncoderState::Paused {
            self.state = EncoderState::Recording;
            self.active_since = Some(now);
        }
    }

    async fn stop(&mut self, now: Instant) -> Result<Vec<Chunk>, CaptureError> {
        if !self.is_stoppable() {
            return Err(CaptureError::Encoder("encoder is not recording".to_string()));
        }
        self.settle(now);
        self.state = EncoderState::Finished;

        let interval_ms = self.data_interval.as_millis().max(1);
        let count = self.recorded.as_millis() / interval_ms;
        debug!(
            "Synthetic encoder finalized: {:.1}s recorded, {} chunks",
            self.recorded.as_secs_f64(),
            count
        );

        Ok((0..count)
            .map(|_| Chunk::new(vec![self.fill; self.chunk_size]))
            .collect())
    }

    fn discard(&mut self) {
        if self.state == EncoderState::Finished {
            warn!("Discarding an encoder that already finished");
        }
        self.state = EncoderState::Finished;
        self.active_since = None;
        self.recorded = Duration::ZERO;
    }

    fn is_stoppable(&self) -> bool {
        matches!(self.state, EncoderState::Recording | EncoderState::Paused)
    }
}
