use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::error;

use crate::error::{ReplayError, ReplayResult};
use crate::output::SavedReplay;
use crate::replay::{Command, ReplayController, ReplayEvent, ReplayStatus};

/// Result of a successfully applied command
#[derive(Debug)]
pub enum CommandOutcome {
    Started,
    Paused,
    Resumed,
    Looping(bool),
    Saved(SavedReplay),
}

/// Status as of the last step, plus the recording clock so elapsed time can
/// be read between steps
#[derive(Debug, Clone)]
pub(crate) struct StatusSnapshot {
    status: ReplayStatus,
    recorded: Duration,
    recording_since: Option<Instant>,
}

impl StatusSnapshot {
    pub(crate) fn capture(controller: &ReplayController, now: Instant) -> Self {
        let (recorded, recording_since) = controller.recording_clock();
        Self {
            status: controller.status(now),
            recorded,
            recording_since,
        }
    }

    fn at(&self, now: Instant) -> ReplayStatus {
        let elapsed = match self.recording_since {
            Some(since) => self.recorded + now.saturating_duration_since(since),
            None => self.recorded,
        };
        ReplayStatus {
            recording_elapsed_seconds: elapsed.as_secs(),
            ..self.status.clone()
        }
    }
}

pub(crate) enum Request {
    Command {
        command: Command,
        reply: oneshot::Sender<ReplayResult<CommandOutcome>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running replay service
#[derive(Clone)]
pub struct ReplayHandle {
    requests: mpsc::Sender<Request>,
    status: watch::Receiver<StatusSnapshot>,
    events: broadcast::Sender<ReplayEvent>,
}

impl ReplayHandle {
    pub(crate) fn new(
        requests: mpsc::Sender<Request>,
        status: watch::Receiver<StatusSnapshot>,
        events: broadcast::Sender<ReplayEvent>,
    ) -> Self {
        Self {
            requests,
            status,
            events,
        }
    }

    /// Send a command and wait for it to be applied
    pub async fn command(&self, command: Command) -> ReplayResult<CommandOutcome> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Command { command, reply })
            .await
            .map_err(|_| ReplayError::ServiceStopped)?;
        rx.await.map_err(|_| ReplayError::ServiceStopped)?
    }

    pub async fn start(&self) -> ReplayResult<()> {
        self.command(Command::Start).await.map(|_| ())
    }

    pub async fn pause(&self) -> ReplayResult<()> {
        self.command(Command::Pause).await.map(|_| ())
    }

    pub async fn resume(&self) -> ReplayResult<()> {
        self.command(Command::Resume).await.map(|_| ())
    }

    /// Returns the new looping flag
    pub async fn toggle_loop(&self) -> ReplayResult<bool> {
        match self.command(Command::ToggleLoop).await? {
            CommandOutcome::Looping(enabled) => Ok(enabled),
            other => Err(unexpected_reply(Command::ToggleLoop, other)),
        }
    }

    pub async fn save(&self) -> ReplayResult<SavedReplay> {
        match self.command(Command::Save).await? {
            CommandOutcome::Saved(saved) => Ok(saved),
            other => Err(unexpected_reply(Command::Save, other)),
        }
    }

    /// Latest published status, with elapsed recording time read live
    pub fn status(&self) -> ReplayStatus {
        self.status.borrow().at(Instant::now())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReplayEvent> {
        self.events.subscribe()
    }

    /// Stop the service, releasing any capture session
    pub async fn shutdown(&self) -> ReplayResult<()> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Shutdown { reply })
            .await
            .map_err(|_| ReplayError::ServiceStopped)?;
        rx.await.map_err(|_| ReplayError::ServiceStopped)
    }
}

fn unexpected_reply(command: Command, outcome: CommandOutcome) -> ReplayError {
    error!("Replay service answered {} with {:?}", command, outcome);
    ReplayError::UnexpectedReply(command)
}
