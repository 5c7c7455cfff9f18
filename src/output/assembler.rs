use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;
use tracing::info;

use crate::error::ReplayError;
use crate::replay::FinalizedSegment;

/// MIME type of assembled artifacts
pub const ARTIFACT_MIME_TYPE: &str = "video/mp4";

/// A single binary artifact built from a finalized segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub data: Vec<u8>,
    pub mime_type: &'static str,
}

impl Artifact {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct SavedReplay {
    pub artifact: Artifact,
    pub filename: String,
    /// Estimated footage length encoded in the filename
    pub duration_secs: u64,
    pub segment_id: u64,
}

/// Summary of a saved replay, without the payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReplaySummary {
    pub filename: String,
    pub duration_secs: u64,
    pub bytes: usize,
    pub mime_type: &'static str,
}

impl From<&SavedReplay> for SavedReplaySummary {
    fn from(saved: &SavedReplay) -> Self {
        Self {
            filename: saved.filename.clone(),
            duration_secs: saved.duration_secs,
            bytes: saved.artifact.len(),
            mime_type: saved.artifact.mime_type,
        }
    }
}

/// Turns finalized segments into artifacts and filenames
#[derive(Debug, Clone)]
pub struct OutputAssembler {
    prefix: String,
    rotation_interval: Duration,
}

impl OutputAssembler {
    pub fn new(prefix: impl Into<String>, rotation_interval: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            rotation_interval,
        }
    }

    /// Footage estimate: one rotation interval per segment live at save time
    pub fn estimated_duration_secs(&self, segment_count: usize) -> u64 {
        (self.rotation_interval * segment_count as u32).as_secs()
    }

    /// `<prefix>-YYYY-MM-DD HH-MMSS_<duration>s.mp4`
    pub fn filename<Tz>(&self, at: &DateTime<Tz>, duration_secs: u64) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        format!(
            "{}-{}_{}s.mp4",
            self.prefix,
            at.format("%Y-%m-%d %H-%M%S"),
            duration_secs
        )
    }

    /// Concatenate the segment's chunks into one artifact
    pub fn assemble<Tz>(
        &self,
        segment: FinalizedSegment,
        segment_count: usize,
        at: &DateTime<Tz>,
    ) -> Result<SavedReplay, ReplayError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if segment.chunks().is_empty() {
            return Err(ReplayError::EmptyArtifact);
        }

        let mut data = Vec::with_capacity(segment.byte_len());
        for chunk in segment.chunks() {
            data.extend_from_slice(&chunk.data);
        }

        let duration_secs = self.estimated_duration_secs(segment_count);
        let filename = self.filename(at, duration_secs);

        info!(
            "Assembled {} ({} chunks, {} bytes)",
            filename,
            segment.chunks().len(),
            data.len()
        );

        Ok(SavedReplay {
            artifact: Artifact {
                data,
                mime_type: ARTIFACT_MIME_TYPE,
            },
            filename,
            duration_secs,
            segment_id: segment.id(),
        })
    }
}
