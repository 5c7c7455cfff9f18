// Tests for the replay service task
//
// Tokio time is paused, so sleeps jump straight to the next timer and the
// service sees exact tick instants.

mod common;

use std::time::Duration;

use anyhow::Result;
use common::{test_config, MockCapture, MockControls};
use pylae::{
    Mode, ReplayController, ReplayError, ReplayEvent, ReplayService, SyntheticCapture,
    SyntheticConfig,
};

fn synthetic_source() -> SyntheticCapture {
    SyntheticCapture::new(SyntheticConfig {
        data_interval: Duration::from_secs(1),
        chunk_size: 4,
        fail_with: None,
    })
}

#[tokio::test(start_paused = true)]
async fn test_start_counts_down_then_records() -> Result<()> {
    let controller = ReplayController::new(test_config(), Box::new(synthetic_source()))?;
    let (replay, _task) = ReplayService::spawn(controller);

    replay.start().await?;
    let status = replay.status();
    assert_eq!(status.mode, Mode::CountingDown);
    assert_eq!(status.countdown_remaining, 3);
    assert_eq!(status.window_capacity, 11);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(replay.status().countdown_remaining, 2);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let status = replay.status();
    assert_eq!(status.mode, Mode::Recording);
    assert_eq!(status.window_length, 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_save_after_rotations() -> Result<()> {
    let controller = ReplayController::new(test_config(), Box::new(synthetic_source()))?;
    let (replay, _task) = ReplayService::spawn(controller);

    replay.start().await?;
    // Countdown ends at 3s, rotations at 6s, 9s and 12s
    tokio::time::sleep(Duration::from_millis(12_500)).await;
    assert_eq!(replay.status().window_length, 4);
    assert_eq!(replay.status().recording_elapsed_seconds, 9);

    let saved = replay.save().await?;

    assert!(saved.filename.ends_with("_12s.mp4"));
    assert_eq!(saved.segment_id, 1);
    // Target recorded 9.5s: nine whole chunks
    assert_eq!(saved.artifact.len(), 9 * 4);
    assert_eq!(replay.status().mode, Mode::Stopped);
    assert_eq!(replay.status().window_length, 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_paused_service_stops_rotating() -> Result<()> {
    let controller = ReplayController::new(test_config(), Box::new(synthetic_source()))?;
    let (replay, _task) = ReplayService::spawn(controller);

    replay.start().await?;
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    replay.pause().await?;
    assert_eq!(replay.status().window_length, 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    let status = replay.status();
    assert_eq!(status.mode, Mode::Paused);
    assert_eq!(status.window_length, 2);

    replay.resume().await?;
    tokio::time::sleep(Duration::from_millis(3_100)).await;
    assert_eq!(replay.status().window_length, 3);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_time_advances_without_rotation() -> Result<()> {
    let controller = ReplayController::new(test_config(), Box::new(synthetic_source()))?;
    let (replay, _task) = ReplayService::spawn(controller);

    replay.start().await?;
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(replay.status().recording_elapsed_seconds, 1);

    // No timer is armed once looping is off
    assert!(!replay.toggle_loop().await?);
    tokio::time::sleep(Duration::from_secs(30)).await;

    let status = replay.status();
    assert_eq!(status.mode, Mode::Recording);
    assert_eq!(status.window_length, 1);
    assert_eq!(status.recording_elapsed_seconds, 31);

    replay.pause().await?;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(replay.status().recording_elapsed_seconds, 31);

    replay.resume().await?;
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(replay.status().recording_elapsed_seconds, 33);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_toggle_loop_through_handle() -> Result<()> {
    let controller = ReplayController::new(test_config(), Box::new(synthetic_source()))?;
    let (replay, _task) = ReplayService::spawn(controller);

    replay.start().await?;
    tokio::time::sleep(Duration::from_millis(9_500)).await;
    assert_eq!(replay.status().window_length, 3);

    assert!(!replay.toggle_loop().await?);
    assert_eq!(replay.status().window_length, 1);
    assert!(!replay.status().looping_enabled);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_revocation_stops_service_controller() -> Result<()> {
    let source = synthetic_source();
    let revoker = source.revoker();
    let controller = ReplayController::new(test_config(), Box::new(source))?;
    let (replay, _task) = ReplayService::spawn(controller);
    let mut events = replay.subscribe();

    replay.start().await?;
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(replay.status().mode, Mode::Recording);

    revoker.revoke();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(replay.status().mode, Mode::Stopped);
    let mut saw_capture_ended = false;
    while let Ok(event) = events.try_recv() {
        if event == ReplayEvent::CaptureEnded {
            saw_capture_ended = true;
        }
    }
    assert!(saw_capture_ended);

    // A fresh start acquires a new session
    replay.start().await?;
    assert_eq!(replay.status().mode, Mode::CountingDown);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_command_errors_are_returned() -> Result<()> {
    let controls = MockControls::default();
    MockControls::set(&controls.deny, true);
    let controller =
        ReplayController::new(test_config(), Box::new(MockCapture::new(controls.clone())))?;
    let (replay, _task) = ReplayService::spawn(controller);

    assert!(matches!(
        replay.start().await,
        Err(ReplayError::PermissionDenied(_))
    ));
    assert!(matches!(
        replay.save().await,
        Err(ReplayError::InvalidCommand { .. })
    ));
    assert_eq!(replay.status().mode, Mode::Stopped);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_session() -> Result<()> {
    let controls = MockControls::default();
    let controller =
        ReplayController::new(test_config(), Box::new(MockCapture::new(controls.clone())))?;
    let (replay, task) = ReplayService::spawn(controller);

    replay.start().await?;
    tokio::time::sleep(Duration::from_secs(5)).await;

    replay.shutdown().await?;
    task.await?;

    assert_eq!(MockControls::count(&controls.released), 1);
    assert_eq!(MockControls::count(&controls.encoders_discarded), 1);
    assert!(matches!(
        replay.start().await,
        Err(ReplayError::ServiceStopped)
    ));

    Ok(())
}
