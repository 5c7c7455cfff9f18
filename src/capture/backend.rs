use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Errors raised by capture collaborators
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture source unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("capture session released")]
    Released,

    #[error("encoder error: {0}")]
    Encoder(String),
}

/// One opaque piece of encoded media, as delivered by an encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Capture source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    /// In-process generator producing deterministic chunks
    #[default]
    Synthetic,
    /// No capture backend; every acquisition fails
    Disabled,
}

/// Simulated acquisition failure for the synthetic source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquireFailure {
    Unavailable,
    Denied,
}

/// Capture source trait
///
/// Acquiring a source may suspend (e.g. while the user answers a permission
/// prompt); everything after acquisition is synchronous except finalizing a
/// segment.
#[async_trait::async_trait]
pub trait CaptureSource: Send {
    /// Acquire a new capture session
    async fn acquire(&mut self) -> Result<Box<dyn CaptureSession>, CaptureError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// A live capture session. Segments are cut from its stream.
#[async_trait::async_trait]
pub trait CaptureSession: Send {
    /// Session identifier for log correlation
    fn id(&self) -> &str;

    /// Create an encoder bound to this session's stream
    fn create_encoder(&mut self) -> Result<Box<dyn SegmentEncoder>, CaptureError>;

    /// Resolves once the underlying source has been revoked.
    ///
    /// Never resolves for a session whose source cannot be revoked.
    async fn ended(&mut self);

    /// Release the session and its underlying source
    fn release(&mut self);
}

/// Encoder for a single segment
#[async_trait::async_trait]
pub trait SegmentEncoder: Send {
    fn start(&mut self, now: Instant) -> Result<(), CaptureError>;

    fn pause(&mut self, now: Instant);

    fn resume(&mut self, now: Instant);

    /// Stop and deliver the finalized chunk sequence
    async fn stop(&mut self, now: Instant) -> Result<Vec<Chunk>, CaptureError>;

    /// Stop and drop everything recorded so far
    fn discard(&mut self);

    /// Whether `stop` can still be attempted
    fn is_stoppable(&self) -> bool;
}

/// Fires the end signal of every session subscribed to it
///
/// Each subscription only observes revocations issued after it was created,
/// so a fresh session is not ended by an earlier revocation.
#[derive(Debug, Clone)]
pub struct Revoker {
    tx: Arc<watch::Sender<u64>>,
}

impl Revoker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Revoke the source; every live subscriber's signal fires
    pub fn revoke(&self) {
        self.tx.send_modify(|generation| *generation += 1);
    }

    pub fn subscribe(&self) -> EndSignal {
        let rx = self.tx.subscribe();
        let baseline = *rx.borrow();
        EndSignal { rx, baseline }
    }
}

impl Default for Revoker {
    fn default() -> Self {
        Self::new()
    }
}

/// Once-firing end signal of a capture session
#[derive(Debug)]
pub struct EndSignal {
    rx: watch::Receiver<u64>,
    baseline: u64,
}

impl EndSignal {
    pub fn has_fired(&self) -> bool {
        *self.rx.borrow() > self.baseline
    }

    /// Wait for the signal. Pends forever if the revoker is dropped unfired.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() > self.baseline {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Source used when capture is disabled; every acquisition fails
pub struct DisabledCapture;

#[async_trait::async_trait]
impl CaptureSource for DisabledCapture {
    async fn acquire(&mut self) -> Result<Box<dyn CaptureSession>, CaptureError> {
        Err(CaptureError::Unavailable(
            "capture is disabled in this configuration".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Capture source factory
pub struct CaptureSourceFactory;

impl CaptureSourceFactory {
    /// Create a capture source for the configured kind
    pub fn create(
        kind: CaptureKind,
        config: super::synthetic::SyntheticConfig,
    ) -> Box<dyn CaptureSource> {
        match kind {
            CaptureKind::Synthetic => Box::new(super::synthetic::SyntheticCapture::new(config)),
            CaptureKind::Disabled => Box::new(DisabledCapture),
        }
    }
}
