use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use super::handle::{CommandOutcome, ReplayHandle, Request, StatusSnapshot};
use crate::error::ReplayResult;
use crate::replay::{Command, ReplayController};

/// Task that exclusively owns a replay controller
///
/// Commands, timer deadlines and capture-ended signals are handled one at a
/// time, so no two transitions ever interleave.
pub struct ReplayService {
    controller: ReplayController,
    requests: mpsc::Receiver<Request>,
    status: watch::Sender<StatusSnapshot>,
}

impl ReplayService {
    /// Spawn the service on the current runtime
    pub fn spawn(controller: ReplayController) -> (ReplayHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(32);
        let (status_tx, status_rx) =
            watch::channel(StatusSnapshot::capture(&controller, Instant::now()));
        let handle = ReplayHandle::new(tx, status_rx, controller.event_sender());

        let service = Self {
            controller,
            requests: rx,
            status: status_tx,
        };
        let task = tokio::spawn(service.run());

        (handle, task)
    }

    async fn run(mut self) {
        info!("Replay service started");

        loop {
            let deadline = self.controller.next_deadline();

            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(Request::Command { command, reply }) => {
                        let outcome = self.dispatch(command).await;
                        // Callers read status right after the reply
                        self.publish_status();
                        if reply.send(outcome).is_err() {
                            warn!("Caller went away before {} completed", command);
                        }
                    }
                    Some(Request::Shutdown { reply }) => {
                        self.controller.shutdown();
                        self.publish_status();
                        let _ = reply.send(());
                        break;
                    }
                    None => break,
                },
                _ = self.controller.capture_ended_signal() => {
                    self.controller.capture_ended();
                }
                _ = wait_until(deadline) => {
                    self.controller.advance_to(Instant::now());
                }
            }

            self.publish_status();
        }

        self.controller.shutdown();
        info!("Replay service stopped");
    }

    async fn dispatch(&mut self, command: Command) -> ReplayResult<CommandOutcome> {
        let now = Instant::now();
        // Ticks due before the command must run first
        self.controller.advance_to(now);

        match command {
            Command::Start => self
                .controller
                .start(now)
                .await
                .map(|_| CommandOutcome::Started),
            Command::Pause => self.controller.pause(now).map(|_| CommandOutcome::Paused),
            Command::Resume => self.controller.resume(now).map(|_| CommandOutcome::Resumed),
            Command::ToggleLoop => self
                .controller
                .toggle_loop(now)
                .map(CommandOutcome::Looping),
            Command::Save => self
                .controller
                .save(now)
                .await
                .map(CommandOutcome::Saved),
        }
    }

    fn publish_status(&self) {
        self.status
            .send_replace(StatusSnapshot::capture(&self.controller, Instant::now()));
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
