use std::collections::VecDeque;
use tokio::time::Instant;
use tracing::{debug, info};

use super::segment::{Segment, SegmentState};
use crate::capture::CaptureSession;
use crate::error::ReplayError;

/// Result of one rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    /// Segment that was created and started
    pub started: u64,
    /// Oldest segment evicted to make room, if the window was full
    pub evicted: Option<u64>,
}

/// Fixed-capacity rolling window of live segments
///
/// Segments are ordered by creation time. Index 0 is the oldest live segment
/// and the only one that can be saved; it covers at least
/// `(len - 1) * rotation_interval` of footage.
pub struct SegmentWindow {
    segments: VecDeque<Segment>,
    capacity: usize,
    looping: bool,
    next_id: u64,
}

impl SegmentWindow {
    pub fn new(capacity: usize, looping: bool) -> Self {
        Self {
            segments: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            looping,
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Create and start a new segment at `now`.
    ///
    /// If the window is full the oldest segment is evicted first, so the
    /// length stays pinned at capacity. A creation failure leaves the window
    /// untouched.
    pub fn rotate(
        &mut self,
        now: Instant,
        session: &mut dyn CaptureSession,
    ) -> Result<Rotation, ReplayError> {
        let encoder = session
            .create_encoder()
            .map_err(ReplayError::SegmentCreationFailed)?;

        let id = self.next_id;
        let mut segment = Segment::new(id, now, encoder);
        segment
            .start(now)
            .map_err(ReplayError::SegmentCreationFailed)?;
        self.next_id += 1;

        let evicted = if self.segments.len() >= self.capacity {
            self.segments.pop_front().map(|oldest| {
                let evicted_id = oldest.id();
                oldest.discard();
                evicted_id
            })
        } else {
            None
        };

        self.segments.push_back(segment);

        debug!(
            "Rotated: started segment {} (window {}/{}, evicted {:?})",
            id,
            self.segments.len(),
            self.capacity,
            evicted
        );

        Ok(Rotation {
            started: id,
            evicted,
        })
    }

    /// Pause every Active segment; returns how many changed
    pub fn pause_all(&mut self, now: Instant) -> usize {
        self.segments
            .iter_mut()
            .map(|segment| segment.pause(now))
            .filter(|changed| *changed)
            .count()
    }

    /// Resume every Paused segment; returns how many changed
    pub fn resume_all(&mut self, now: Instant) -> usize {
        self.segments
            .iter_mut()
            .map(|segment| segment.resume(now))
            .filter(|changed| *changed)
            .count()
    }

    /// Resume the target segment if it is paused
    pub fn resume_target(&mut self, now: Instant) -> bool {
        self.segments
            .front_mut()
            .map(|segment| segment.resume(now))
            .unwrap_or(false)
    }

    /// Whether the target segment exists and is paused
    pub fn target_paused(&self) -> bool {
        self.target()
            .map(|segment| segment.state() == SegmentState::Paused)
            .unwrap_or(false)
    }

    /// Discard everything except the oldest segment; returns how many were dropped
    pub fn shrink_to_oldest(&mut self) -> usize {
        if self.segments.len() <= 1 {
            return 0;
        }
        let dropped = self.segments.split_off(1);
        let count = dropped.len();
        dropped.into_iter().for_each(Segment::discard);
        info!("Window shrunk to oldest segment ({} discarded)", count);
        count
    }

    /// Discard every segment; returns how many were dropped
    pub fn reset(&mut self) -> usize {
        let count = self.segments.len();
        self.segments.drain(..).for_each(Segment::discard);
        if count > 0 {
            debug!("Window reset ({} segments discarded)", count);
        }
        count
    }

    /// The save target: the oldest live segment
    pub fn target(&self) -> Option<&Segment> {
        self.segments.front()
    }

    /// Remove the save target from the window
    pub fn take_target(&mut self) -> Option<Segment> {
        self.segments.pop_front()
    }
}

impl Drop for SegmentWindow {
    fn drop(&mut self) {
        self.reset();
    }
}
