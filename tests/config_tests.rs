// Tests for configuration loading and validation

use std::time::Duration;

use anyhow::Result;
use pylae::capture::CaptureKind;
use pylae::{Config, ReplayConfig, ReplayError};

fn write_config(dir: &tempfile::TempDir, body: &str) -> Result<String> {
    let path = dir.path().join("pylae.toml");
    std::fs::write(&path, body)?;
    Ok(path.to_string_lossy().into_owned())
}

#[test]
fn test_load_full_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(
        &dir,
        r#"
[service]
name = "pylae-test"

[service.http]
bind = "0.0.0.0"
port = 4000

[replay]
rotation_interval_ms = 2000
max_duration_ms = 20000
countdown_from = 5
looping = false

[output]
recordings_path = "/tmp/replays"
filename_prefix = "clip"

[capture]
kind = "disabled"
chunk_size = 16
"#,
    )?;

    let config = Config::load(&path)?;
    assert_eq!(config.service.name, "pylae-test");
    assert_eq!(config.service.http.port, 4000);
    assert_eq!(config.capture.kind, CaptureKind::Disabled);
    assert_eq!(config.output.recordings_path, "/tmp/replays");

    let replay = config.replay_config();
    assert_eq!(replay.rotation_interval, Duration::from_secs(2));
    assert_eq!(replay.capacity(), 10);
    assert_eq!(replay.countdown_from, 5);
    // Unset keys keep their defaults
    assert_eq!(replay.countdown_tick, Duration::from_secs(1));
    assert_eq!(replay.finalize_retries, 1);
    assert!(!replay.looping);
    assert_eq!(replay.filename_prefix, "clip");

    assert_eq!(config.synthetic_config().chunk_size, 16);
    assert_eq!(
        config.synthetic_config().data_interval,
        Duration::from_secs(1)
    );

    Ok(())
}

#[test]
fn test_sections_default_when_missing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(
        &dir,
        r#"
[service]
name = "pylae"

[service.http]
bind = "127.0.0.1"
port = 3333
"#,
    )?;

    let config = Config::load(&path)?;
    let replay = config.replay_config();

    assert_eq!(replay.capacity(), 11);
    assert_eq!(replay.filename_prefix, "pylae-33");
    assert!(replay.looping);
    assert_eq!(config.capture.kind, CaptureKind::Synthetic);
    assert_eq!(config.output.recordings_path, "recordings");

    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::load("/nonexistent/pylae-config").is_err());
}

#[test]
fn test_default_replay_config() -> Result<()> {
    let config = ReplayConfig::default();

    config.validate()?;
    assert_eq!(config.capacity(), 11);
    assert_eq!(config.countdown_from, 3);

    Ok(())
}

#[test]
fn test_capacity_rounds_down() {
    let config = ReplayConfig {
        rotation_interval: Duration::from_secs(3),
        max_duration: Duration::from_secs(10),
        ..Default::default()
    };

    assert_eq!(config.capacity(), 3);
}

#[test]
fn test_validation_rejects_bad_values() {
    let zero_interval = ReplayConfig {
        rotation_interval: Duration::ZERO,
        ..Default::default()
    };
    let window_too_short = ReplayConfig {
        max_duration: Duration::from_secs(2),
        ..Default::default()
    };
    let zero_tick = ReplayConfig {
        countdown_tick: Duration::ZERO,
        ..Default::default()
    };
    let blank_prefix = ReplayConfig {
        filename_prefix: "  ".to_string(),
        ..Default::default()
    };

    for config in [zero_interval, window_too_short, zero_tick, blank_prefix] {
        assert!(matches!(config.validate(), Err(ReplayError::Config(_))));
    }
}
