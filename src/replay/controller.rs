//! Replay controller
//!
//! Top-level state machine. Owns the capture session, the segment window and
//! the scheduler; nothing else mutates them. Every method runs to completion
//! except `start` (capture acquisition) and `save` (segment finalization),
//! and the owner must not interleave two calls.

use chrono::Local;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::config::ReplayConfig;
use super::scheduler::{Scheduler, TaskSlot, Tick};
use super::state::{Command, Mode, ReplayEvent, ReplayStatus};
use super::window::SegmentWindow;
use crate::capture::{CaptureSession, CaptureSource};
use crate::error::{ReplayError, ReplayResult};
use crate::output::{OutputAssembler, SavedReplay};

pub struct ReplayController {
    config: ReplayConfig,
    source: Box<dyn CaptureSource>,
    session: Option<Box<dyn CaptureSession>>,
    window: SegmentWindow,
    scheduler: Scheduler,
    assembler: OutputAssembler,
    mode: Mode,
    countdown_remaining: u32,
    /// Recording time accumulated before the current Recording stretch
    recorded: Duration,
    recording_since: Option<Instant>,
    events: broadcast::Sender<ReplayEvent>,
}

impl ReplayController {
    pub fn new(config: ReplayConfig, source: Box<dyn CaptureSource>) -> ReplayResult<Self> {
        config.validate()?;

        let (events, _) = broadcast::channel(128);
        let window = SegmentWindow::new(config.capacity(), config.looping);
        let assembler = OutputAssembler::new(config.filename_prefix.clone(), config.rotation_interval);

        info!(
            "Replay controller ready: {} source, {}s window in {} segments of {}ms",
            source.name(),
            config.max_duration.as_secs(),
            config.capacity(),
            config.rotation_interval.as_millis()
        );

        Ok(Self {
            config,
            source,
            session: None,
            window,
            scheduler: Scheduler::new(),
            assembler,
            mode: Mode::Stopped,
            countdown_remaining: 0,
            recorded: Duration::ZERO,
            recording_since: None,
            events,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn window(&self) -> &SegmentWindow {
        &self.window
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReplayEvent> {
        self.events.subscribe()
    }

    pub fn event_sender(&self) -> broadcast::Sender<ReplayEvent> {
        self.events.clone()
    }

    pub fn status(&self, now: Instant) -> ReplayStatus {
        ReplayStatus {
            mode: self.mode,
            countdown_remaining: self.countdown_remaining,
            looping_enabled: self.window.looping(),
            recording_elapsed_seconds: self.recording_elapsed(now).as_secs(),
            window_length: self.window.len(),
            window_capacity: self.window.capacity(),
        }
    }

    /// Time spent in Recording since the last start, pauses excluded
    pub fn recording_elapsed(&self, now: Instant) -> Duration {
        match self.recording_since {
            Some(since) => self.recorded + now.saturating_duration_since(since),
            None => self.recorded,
        }
    }

    /// Accumulated recording time and the start of the current stretch
    pub fn recording_clock(&self) -> (Duration, Option<Instant>) {
        (self.recorded, self.recording_since)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Acquire capture and begin the countdown
    pub async fn start(&mut self, now: Instant) -> ReplayResult<()> {
        if self.mode != Mode::Stopped {
            return Err(self.invalid(Command::Start));
        }

        info!("Starting replay capture ({} source)", self.source.name());

        let session = match self.source.acquire().await {
            Ok(session) => session,
            Err(e) => {
                let err = ReplayError::from_acquire(e);
                error!("Failed to start capture: {}", err);
                self.emit(ReplayEvent::StartFailed {
                    error: err.to_string(),
                });
                return Err(err);
            }
        };

        info!("Capture session {} acquired", session.id());
        self.session = Some(session);
        self.window.reset();
        self.recorded = Duration::ZERO;
        self.recording_since = None;
        self.scheduler.cancel_all();

        if self.config.countdown_from == 0 {
            self.begin_recording(now);
            return Ok(());
        }

        self.countdown_remaining = self.config.countdown_from;
        self.set_mode(Mode::CountingDown);
        self.scheduler
            .install(TaskSlot::Countdown, self.config.countdown_tick, now);
        self.emit(ReplayEvent::Countdown {
            remaining: self.countdown_remaining,
        });

        Ok(())
    }

    /// Pause every segment. A no-op when already paused.
    pub fn pause(&mut self, now: Instant) -> ReplayResult<()> {
        match self.mode {
            Mode::Paused => Ok(()),
            Mode::Recording => {
                self.scheduler.cancel_all();
                let paused = self.window.pause_all(now);
                self.stop_clock(now);
                self.set_mode(Mode::Paused);
                info!("Paused {} segments", paused);
                Ok(())
            }
            _ => Err(self.invalid(Command::Pause)),
        }
    }

    /// Resume every segment. A no-op when already recording.
    pub fn resume(&mut self, now: Instant) -> ReplayResult<()> {
        match self.mode {
            Mode::Recording => Ok(()),
            Mode::Paused => {
                self.scheduler.cancel_all();
                let resumed = self.window.resume_all(now);
                self.recording_since = Some(now);
                self.set_mode(Mode::Recording);
                self.sync_rotation_task(now);
                info!("Resumed {} segments", resumed);
                Ok(())
            }
            _ => Err(self.invalid(Command::Resume)),
        }
    }

    /// Flip looping; returns the new value.
    ///
    /// Turning looping off pins recording to the oldest segment.
    pub fn toggle_loop(&mut self, now: Instant) -> ReplayResult<bool> {
        if self.mode == Mode::Saving {
            return Err(self.invalid(Command::ToggleLoop));
        }

        let enabled = !self.window.looping();
        self.window.set_looping(enabled);

        if !enabled {
            self.window.shrink_to_oldest();
        }
        self.sync_rotation_task(now);

        info!(
            "Looping {} (window length {})",
            if enabled { "enabled" } else { "disabled" },
            self.window.len()
        );
        self.emit(ReplayEvent::LoopToggled {
            enabled,
            window_length: self.window.len(),
        });

        Ok(enabled)
    }

    /// Save the oldest segment and stop.
    ///
    /// Accepted while Recording (the window is paused first) or Paused. The
    /// controller ends in Stopped whether or not an artifact was produced,
    /// except for an empty window, which leaves everything untouched.
    pub async fn save(&mut self, now: Instant) -> ReplayResult<SavedReplay> {
        if !matches!(self.mode, Mode::Recording | Mode::Paused) {
            return Err(self.invalid(Command::Save));
        }
        if self.window.is_empty() {
            warn!("Save requested with no active segment");
            return Err(ReplayError::EmptyWindow);
        }
        if self.mode == Mode::Recording {
            self.pause(now)?;
        }

        let segment_count = self.window.len();
        let Some(mut target) = self.window.take_target() else {
            return Err(ReplayError::EmptyWindow);
        };

        self.scheduler.cancel_all();
        self.set_mode(Mode::Saving);
        info!(
            "Saving segment {} ({} segments in window)",
            target.id(),
            segment_count
        );

        let mut attempt = 0;
        let finalized = loop {
            match target.finalize(now).await {
                Ok(finalized) => break Ok(finalized),
                Err(e) if target.is_stoppable() && attempt < self.config.finalize_retries => {
                    attempt += 1;
                    warn!(
                        "Finalizing segment {} failed (attempt {}): {}",
                        target.id(),
                        attempt,
                        e
                    );
                }
                Err(e) => break Err(ReplayError::FinalizeFailed(e)),
            }
        };

        let outcome = finalized
            .and_then(|segment| self.assembler.assemble(segment, segment_count, &Local::now()));

        if target.is_stoppable() {
            target.discard();
        }
        self.teardown();

        match &outcome {
            Ok(saved) => self.emit(ReplayEvent::Saved {
                filename: saved.filename.clone(),
                bytes: saved.artifact.len(),
            }),
            Err(e) => {
                error!("Save failed: {}", e);
                self.emit(ReplayEvent::SaveFailed {
                    error: e.to_string(),
                });
            }
        }

        outcome
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    /// Resolves when the current capture session's source is revoked.
    /// Pends forever while there is no session.
    pub async fn capture_ended_signal(&mut self) {
        match self.session.as_mut() {
            Some(session) => session.ended().await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Force Stopped after the capture source went away. Nothing is saved.
    pub fn capture_ended(&mut self) {
        if self.mode == Mode::Stopped {
            return;
        }
        warn!(
            "Capture ended while {}; discarding {} segments",
            self.mode,
            self.window.len()
        );
        self.teardown();
        self.emit(ReplayEvent::CaptureEnded);
    }

    /// Release everything; used when the owner shuts down
    pub fn shutdown(&mut self) {
        if self.mode != Mode::Stopped || self.session.is_some() {
            info!("Shutting down replay controller");
            self.teardown();
        }
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Run every tick due at or before `now`
    pub fn advance_to(&mut self, now: Instant) {
        while let Some(tick) = self.scheduler.pop_due(now) {
            self.handle_tick(tick);
        }
    }

    /// Handle one tick; stale ticks are dropped
    pub fn handle_tick(&mut self, tick: Tick) {
        if !self.scheduler.is_current(&tick) {
            debug!("Dropping stale {:?} tick", tick.slot);
            return;
        }
        match tick.slot {
            TaskSlot::Countdown => self.on_countdown_tick(tick.due),
            TaskSlot::Rotation => self.on_rotation_tick(tick.due),
        }
    }

    fn on_countdown_tick(&mut self, at: Instant) {
        if self.mode != Mode::CountingDown {
            self.scheduler.cancel(TaskSlot::Countdown);
            return;
        }

        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        if self.config.debug {
            debug!("Countdown: {}", self.countdown_remaining);
        }
        self.emit(ReplayEvent::Countdown {
            remaining: self.countdown_remaining,
        });

        if self.countdown_remaining == 0 {
            self.begin_recording(at);
        }
    }

    fn on_rotation_tick(&mut self, at: Instant) {
        if self.mode != Mode::Recording {
            self.scheduler.cancel(TaskSlot::Rotation);
            return;
        }

        if self.window.target_paused() {
            self.window.resume_target(at);
        } else if self.window.looping() || self.window.is_empty() {
            self.rotate(at);
        }

        self.sync_rotation_task(at);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn begin_recording(&mut self, at: Instant) {
        self.scheduler.cancel_all();
        self.countdown_remaining = 0;
        self.recording_since = Some(at);
        self.set_mode(Mode::Recording);
        self.rotate(at);
        self.sync_rotation_task(at);
    }

    fn rotate(&mut self, at: Instant) {
        let Some(session) = self.session.as_deref_mut() else {
            warn!("Rotation without a capture session");
            return;
        };

        match self.window.rotate(at, session) {
            Ok(rotation) => {
                if let Some(evicted) = rotation.evicted {
                    self.emit(ReplayEvent::SegmentEvicted { segment_id: evicted });
                }
                if self.config.debug {
                    debug!(
                        "Segment {} started, window {}/{}",
                        rotation.started,
                        self.window.len(),
                        self.window.capacity()
                    );
                }
                self.emit(ReplayEvent::SegmentStarted {
                    segment_id: rotation.started,
                    window_length: self.window.len(),
                });
            }
            Err(e) => {
                warn!("Skipping rotation: {}", e);
                self.emit(ReplayEvent::SegmentCreationFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    /// Rotation runs while Recording and either looping or still waiting for
    /// a first segment. Installing restarts the period from `now`.
    fn sync_rotation_task(&mut self, now: Instant) {
        let wanted =
            self.mode == Mode::Recording && (self.window.looping() || self.window.is_empty());
        let active = self.scheduler.is_active(TaskSlot::Rotation);

        if wanted && !active {
            self.scheduler
                .install(TaskSlot::Rotation, self.config.rotation_interval, now);
        } else if !wanted && active {
            self.scheduler.cancel(TaskSlot::Rotation);
        }
    }

    fn stop_clock(&mut self, now: Instant) {
        if let Some(since) = self.recording_since.take() {
            self.recorded += now.saturating_duration_since(since);
        }
    }

    fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.window.reset();
        if let Some(mut session) = self.session.take() {
            session.release();
        }
        self.countdown_remaining = 0;
        self.recorded = Duration::ZERO;
        self.recording_since = None;
        self.set_mode(Mode::Stopped);
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!("Mode: {} -> {}", self.mode, mode);
            self.mode = mode;
            self.emit(ReplayEvent::ModeChanged { mode });
        }
    }

    fn invalid(&self, command: Command) -> ReplayError {
        debug!("Rejected {} while {}", command, self.mode);
        ReplayError::InvalidCommand {
            command,
            mode: self.mode,
        }
    }

    fn emit(&self, event: ReplayEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
