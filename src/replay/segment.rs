use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::capture::{CaptureError, Chunk, SegmentEncoder};

/// Lifecycle state of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentState {
    Created,
    Active,
    Paused,
    Stopped,
}

/// One bounded recording unit
///
/// Records from its own creation time until it is stopped. Chunks live in the
/// encoder until `finalize`, which is the only way to get them out.
pub struct Segment {
    id: u64,
    created_at: Instant,
    state: SegmentState,
    encoder: Box<dyn SegmentEncoder>,
    active_since: Option<Instant>,
    active: Duration,
}

/// Chunks of a stopped segment. Immutable once built.
#[derive(Debug, Clone)]
pub struct FinalizedSegment {
    id: u64,
    created_at: Instant,
    active: Duration,
    chunks: Vec<Chunk>,
}

impl FinalizedSegment {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time the segment spent recording
    pub fn active_duration(&self) -> Duration {
        self.active
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }
}

impl Segment {
    pub fn new(id: u64, created_at: Instant, encoder: Box<dyn SegmentEncoder>) -> Self {
        Self {
            id,
            created_at,
            state: SegmentState::Created,
            encoder,
            active_since: None,
            active: Duration::ZERO,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    /// Time spent Active as of `now`
    pub fn active_duration(&self, now: Instant) -> Duration {
        match self.active_since {
            Some(since) => self.active + now.saturating_duration_since(since),
            None => self.active,
        }
    }

    pub fn start(&mut self, now: Instant) -> Result<(), CaptureError> {
        if self.state != SegmentState::Created {
            return Err(CaptureError::Encoder(format!(
                "segment {} already started",
                self.id
            )));
        }
        self.encoder.start(now)?;
        self.state = SegmentState::Active;
        self.active_since = Some(now);
        Ok(())
    }

    /// Returns false when the segment was not Active
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.state != SegmentState::Active {
            return false;
        }
        self.encoder.pause(now);
        self.settle(now);
        self.state = SegmentState::Paused;
        true
    }

    /// Returns false when the segment was not Paused
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.state != SegmentState::Paused {
            return false;
        }
        self.encoder.resume(now);
        self.state = SegmentState::Active;
        self.active_since = Some(now);
        true
    }

    pub fn is_stoppable(&self) -> bool {
        matches!(self.state, SegmentState::Active | SegmentState::Paused)
            && self.encoder.is_stoppable()
    }

    /// Stop the segment and drop its data
    pub fn discard(mut self) {
        debug!("Discarding segment {}", self.id);
        self.encoder.discard();
        self.state = SegmentState::Stopped;
    }

    /// Stop the segment and take its chunks.
    ///
    /// On failure the segment stays in its current state if the encoder can
    /// still be stopped, so the caller may retry.
    pub async fn finalize(&mut self, now: Instant) -> Result<FinalizedSegment, CaptureError> {
        if !self.is_stoppable() {
            return Err(CaptureError::Encoder(format!(
                "segment {} is not stoppable ({:?})",
                self.id, self.state
            )));
        }

        match self.encoder.stop(now).await {
            Ok(chunks) => {
                self.settle(now);
                self.state = SegmentState::Stopped;
                Ok(FinalizedSegment {
                    id: self.id,
                    created_at: self.created_at,
                    active: self.active,
                    chunks,
                })
            }
            Err(e) => {
                if !self.encoder.is_stoppable() {
                    self.settle(now);
                    self.state = SegmentState::Stopped;
                }
                Err(e)
            }
        }
    }

    fn settle(&mut self, now: Instant) {
        if let Some(since) = self.active_since.take() {
            self.active += now.saturating_duration_since(since);
        }
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("active", &self.active)
            .finish()
    }
}
