use std::time::Duration;

use crate::error::ReplayError;

/// Configuration for a replay controller
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Spacing between segment starts
    /// Default: 3 seconds
    pub rotation_interval: Duration,

    /// Length of the rolling window; capacity is max_duration / rotation_interval
    /// Default: 33 seconds
    pub max_duration: Duration,

    /// Countdown seconds between acquiring capture and the first segment
    pub countdown_from: u32,

    /// Period of one countdown step
    pub countdown_tick: Duration,

    /// Whether rotation is enabled when recording begins
    pub looping: bool,

    /// Extra finalize attempts while the target segment is still stoppable
    pub finalize_retries: u32,

    /// Prefix of saved artifact filenames
    pub filename_prefix: String,

    /// Verbose per-tick logging
    pub debug: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            rotation_interval: Duration::from_secs(3),
            max_duration: Duration::from_secs(33), // 11 segments
            countdown_from: 3,
            countdown_tick: Duration::from_secs(1),
            looping: true,
            finalize_retries: 1,
            filename_prefix: "pylae-33".to_string(),
            debug: false,
        }
    }
}

impl ReplayConfig {
    /// Maximum number of live segments
    pub fn capacity(&self) -> usize {
        let interval = self.rotation_interval.as_millis();
        if interval == 0 {
            return 0;
        }
        (self.max_duration.as_millis() / interval) as usize
    }

    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.rotation_interval.is_zero() {
            return Err(ReplayError::Config(
                "rotation interval must be greater than zero".to_string(),
            ));
        }
        if self.capacity() == 0 {
            return Err(ReplayError::Config(format!(
                "max duration {}ms is shorter than one rotation interval ({}ms)",
                self.max_duration.as_millis(),
                self.rotation_interval.as_millis()
            )));
        }
        if self.countdown_tick.is_zero() {
            return Err(ReplayError::Config(
                "countdown tick must be greater than zero".to_string(),
            ));
        }
        if self.filename_prefix.trim().is_empty() {
            return Err(ReplayError::Config("filename prefix must not be empty".to_string()));
        }
        Ok(())
    }
}
