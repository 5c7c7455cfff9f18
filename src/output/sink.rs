use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use super::assembler::SavedReplay;

/// Writes saved replays into a recordings directory
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: PathBuf,
}

impl ArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create recordings directory: {:?}", dir))?;

        info!("Artifact sink writing to {}", dir.display());

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the artifact under its filename; returns the full path
    pub async fn persist(&self, saved: &SavedReplay) -> Result<PathBuf> {
        let path = self.dir.join(&saved.filename);

        tokio::fs::write(&path, &saved.artifact.data)
            .await
            .with_context(|| format!("Failed to write artifact: {:?}", path))?;

        info!(
            "Saved replay: {} ({} bytes)",
            path.display(),
            saved.artifact.len()
        );

        Ok(path)
    }
}
