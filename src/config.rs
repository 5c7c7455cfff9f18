use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::capture::{AcquireFailure, CaptureKind, SyntheticConfig};
use crate::replay::ReplayConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub replay: ReplaySection,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplaySection {
    pub rotation_interval_ms: u64,
    pub max_duration_ms: u64,
    pub countdown_from: u32,
    pub countdown_tick_ms: u64,
    pub looping: bool,
    pub finalize_retries: u32,
    pub debug: bool,
}

impl Default for ReplaySection {
    fn default() -> Self {
        Self {
            rotation_interval_ms: 3000,
            max_duration_ms: 33000,
            countdown_from: 3,
            countdown_tick_ms: 1000,
            looping: true,
            finalize_retries: 1,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub recordings_path: String,
    pub filename_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            recordings_path: "recordings".to_string(),
            filename_prefix: "pylae-33".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub kind: CaptureKind,
    pub data_interval_ms: u64,
    pub chunk_size: usize,
    pub fail_with: Option<AcquireFailure>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            kind: CaptureKind::Synthetic,
            data_interval_ms: 1000,
            chunk_size: 4096,
            fail_with: None,
        }
    }
}

impl Config {
    /// Load from a config file (extension optional), overridden by `PYLAE__*`
    /// environment variables, e.g. `PYLAE__SERVICE__HTTP__PORT=9000`
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("PYLAE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn replay_config(&self) -> ReplayConfig {
        ReplayConfig {
            rotation_interval: Duration::from_millis(self.replay.rotation_interval_ms),
            max_duration: Duration::from_millis(self.replay.max_duration_ms),
            countdown_from: self.replay.countdown_from,
            countdown_tick: Duration::from_millis(self.replay.countdown_tick_ms),
            looping: self.replay.looping,
            finalize_retries: self.replay.finalize_retries,
            filename_prefix: self.output.filename_prefix.clone(),
            debug: self.replay.debug,
        }
    }

    pub fn synthetic_config(&self) -> SyntheticConfig {
        SyntheticConfig {
            data_interval: Duration::from_millis(self.capture.data_interval_ms),
            chunk_size: self.capture.chunk_size,
            fail_with: self.capture.fail_with,
        }
    }
}
