//! One launch-to-restore lifecycle for a single edition.
//!
//! The session is the only place that blocks: bounded polling waits during
//! `AwaitingStart` and `Monitoring`, both preemptible by the cancellation
//! token so cancellation is never starved by a sleep.

use crate::launcher::LaunchHandler;
use crate::model::{FailureReason, LaunchEvent, LifecycleState, SessionConfig, SessionResult, StatusReport};
use crate::probe::ProcessProbe;
use crate::registry::EditionDescriptor;
use crate::shell::ShellControl;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of the bounded start wait.
enum StartWait {
    Running,
    TimedOut,
    Cancelled,
}

pub struct LaunchSession {
    edition: EditionDescriptor,
    cfg: SessionConfig,
    probe: Arc<dyn ProcessProbe>,
    shell: Arc<dyn ShellControl>,
    launcher: Arc<dyn LaunchHandler>,
}

impl LaunchSession {
    pub fn new(
        edition: EditionDescriptor,
        cfg: SessionConfig,
        probe: Arc<dyn ProcessProbe>,
        shell: Arc<dyn ShellControl>,
        launcher: Arc<dyn LaunchHandler>,
    ) -> Self {
        Self {
            edition,
            cfg,
            probe,
            shell,
            launcher,
        }
    }

    /// Drive the state machine to a terminal state. Never panics and never
    /// returns early without honoring the suspend/restore pairing: once the
    /// shell suspend has been attempted, every exit path goes through the
    /// restore attempt, including cancellation.
    pub async fn run(
        self,
        event_tx: UnboundedSender<LaunchEvent>,
        cancel: CancellationToken,
    ) -> SessionResult {
        let mut report = StatusReport::default();

        self.transition(&event_tx, LifecycleState::Launching);
        if !self.launcher.launch(&self.edition) {
            self.transition(&event_tx, LifecycleState::Failed);
            return SessionResult::failed(report, FailureReason::LaunchFailed);
        }

        self.transition(&event_tx, LifecycleState::AwaitingStart);
        match self.await_start(&cancel).await {
            StartWait::Running => {}
            StartWait::TimedOut => {
                warn!(edition = %self.edition.id, "game process not observed before the deadline");
                self.transition(&event_tx, LifecycleState::Failed);
                return SessionResult::failed(report, FailureReason::StartTimeout);
            }
            StartWait::Cancelled => {
                info!(edition = %self.edition.id, "cancelled while waiting for the game to start");
                self.transition(&event_tx, LifecycleState::Failed);
                return SessionResult::failed(report, FailureReason::Cancelled);
            }
        }
        report.forza_started = true;

        // Suspend failure is not fatal: the game is already running, so
        // monitoring proceeds and the degraded flag rides in the report.
        self.transition(&event_tx, LifecycleState::ShellSuspending);
        report.explorer_killed = self.shell.suspend();
        if !report.explorer_killed {
            warn!("shell suspend failed; continuing to monitor");
        }
        info!(
            explorer_killed = report.explorer_killed,
            forza_started = report.forza_started,
            "initial status"
        );
        let _ = event_tx.send(LaunchEvent::InitialStatus { report });

        self.transition(&event_tx, LifecycleState::Monitoring);
        let cancelled = self.monitor(&cancel).await;
        if cancelled {
            info!(edition = %self.edition.id, "cancelled while monitoring; restoring the shell first");
        } else {
            info!(edition = %self.edition.id, "game process gone, restoring the shell");
        }

        // Restore failure cannot be recovered automatically and must not
        // block exit; Done always follows.
        self.transition(&event_tx, LifecycleState::ShellRestoring);
        if !self.shell.restore() {
            warn!("shell restore failed");
        }

        self.transition(&event_tx, LifecycleState::Done);
        if cancelled {
            SessionResult::failed(report, FailureReason::Cancelled)
        } else {
            SessionResult::completed(report)
        }
    }

    /// Poll until the game appears, the monotonic deadline passes, or the
    /// session is cancelled. The deadline is measured from entry into
    /// `AwaitingStart`, not from the launch request.
    async fn await_start(&self, cancel: &CancellationToken) -> StartWait {
        let deadline = Instant::now() + self.cfg.start_timeout;
        loop {
            if Instant::now() >= deadline {
                return StartWait::TimedOut;
            }
            if self.probe.is_running(&self.edition) {
                return StartWait::Running;
            }
            tokio::select! {
                () = cancel.cancelled() => return StartWait::Cancelled,
                () = tokio::time::sleep(self.cfg.start_poll_interval) => {}
            }
        }
    }

    /// Poll while the game is running. Returns true when it was cancelled
    /// rather than the process disappearing.
    async fn monitor(&self, cancel: &CancellationToken) -> bool {
        loop {
            if !self.probe.is_running(&self.edition) {
                return false;
            }
            tokio::select! {
                () = cancel.cancelled() => return true,
                () = tokio::time::sleep(self.cfg.run_poll_interval) => {}
            }
        }
    }

    fn transition(&self, event_tx: &UnboundedSender<LaunchEvent>, state: LifecycleState) {
        info!(edition = %self.edition.id, ?state, "state changed");
        let _ = event_tx.send(LaunchEvent::StateChanged { state });
    }
}
