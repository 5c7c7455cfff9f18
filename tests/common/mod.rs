// Scriptable capture collaborators shared by the integration tests
//
// Every knob lives behind an Arc so tests can flip it after the capture
// source has been moved into a controller or service.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pylae::capture::{
    CaptureError, CaptureSession, CaptureSource, Chunk, EndSignal, Revoker, SegmentEncoder,
};
use pylae::{ReplayConfig, ReplayController};
use tokio::time::Instant;

#[derive(Clone, Default)]
pub struct MockControls {
    pub deny: Arc<AtomicBool>,
    pub unavailable: Arc<AtomicBool>,
    pub fail_encoders: Arc<AtomicBool>,
    pub finalize_failures: Arc<AtomicUsize>,
    pub empty_output: Arc<AtomicBool>,
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub encoders_started: Arc<AtomicUsize>,
    pub encoders_stopped: Arc<AtomicUsize>,
    pub encoders_discarded: Arc<AtomicUsize>,
    pub revoker: Revoker,
}

impl MockControls {
    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockCapture {
    controls: MockControls,
}

impl MockCapture {
    pub fn new(controls: MockControls) -> Self {
        Self { controls }
    }
}

#[async_trait::async_trait]
impl CaptureSource for MockCapture {
    async fn acquire(&mut self) -> Result<Box<dyn CaptureSession>, CaptureError> {
        if self.controls.deny.load(Ordering::SeqCst) {
            return Err(CaptureError::PermissionDenied("user declined".to_string()));
        }
        if self.controls.unavailable.load(Ordering::SeqCst) {
            return Err(CaptureError::Unavailable("no display".to_string()));
        }
        self.controls.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            controls: self.controls.clone(),
            signal: self.controls.revoker.subscribe(),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct MockSession {
    controls: MockControls,
    signal: EndSignal,
}

#[async_trait::async_trait]
impl CaptureSession for MockSession {
    fn id(&self) -> &str {
        "mock-session"
    }

    fn create_encoder(&mut self) -> Result<Box<dyn SegmentEncoder>, CaptureError> {
        if self.controls.fail_encoders.load(Ordering::SeqCst) {
            return Err(CaptureError::Encoder("injected encoder failure".to_string()));
        }
        Ok(Box::new(MockEncoder {
            controls: self.controls.clone(),
            state: EncoderState::Idle,
        }))
    }

    async fn ended(&mut self) {
        self.signal.wait().await;
    }

    fn release(&mut self) {
        self.controls.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum EncoderState {
    Idle,
    Recording,
    Paused,
    Done,
}

pub struct MockEncoder {
    controls: MockControls,
    state: EncoderState,
}

#[async_trait::async_trait]
impl SegmentEncoder for MockEncoder {
    fn start(&mut self, _now: Instant) -> Result<(), CaptureError> {
        self.controls.encoders_started.fetch_add(1, Ordering::SeqCst);
        self.state = EncoderState::Recording;
        Ok(())
    }

    fn pause(&mut self, _now: Instant) {
        if self.state == EncoderState::Recording {
            self.state = EncoderState::Paused;
        }
    }

    fn resume(&mut self, _now: Instant) {
        if self.state == EncoderState::Paused {
            self.state = EncoderState::Recording;
        }
    }

    async fn stop(&mut self, _now: Instant) -> Result<Vec<Chunk>, CaptureError> {
        let pending_failures = self.controls.finalize_failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.controls
                .finalize_failures
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(CaptureError::Encoder("injected finalize failure".to_string()));
        }

        self.controls.encoders_stopped.fetch_add(1, Ordering::SeqCst);
        self.state = EncoderState::Done;
        if self.controls.empty_output.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(vec![Chunk::new(vec![1u8; 8]), Chunk::new(vec![2u8; 8])])
    }

    fn discard(&mut self) {
        self.controls.encoders_discarded.fetch_add(1, Ordering::SeqCst);
        self.state = EncoderState::Done;
    }

    fn is_stoppable(&self) -> bool {
        matches!(self.state, EncoderState::Recording | EncoderState::Paused)
    }
}

/// 3s rotation, 33s window, 3s countdown
pub fn test_config() -> ReplayConfig {
    ReplayConfig::default()
}

pub fn controller_with(config: ReplayConfig) -> (ReplayController, MockControls) {
    let controls = MockControls::default();
    let controller = ReplayController::new(config, Box::new(MockCapture::new(controls.clone())))
        .expect("valid test config");
    (controller, controls)
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// Start a controller and run its countdown to completion.
///
/// Returns the instant the first segment was created.
pub async fn recording_controller(
    config: ReplayConfig,
) -> (ReplayController, MockControls, Instant) {
    let countdown = config.countdown_tick * config.countdown_from;
    let (mut controller, controls) = controller_with(config);
    let started = Instant::now();
    controller.start(started).await.expect("start succeeds");
    let t0 = started + countdown;
    controller.advance_to(t0);
    (controller, controls, t0)
}
