use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for one launch session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hard deadline for the game process to appear after the launch request.
    #[serde(with = "humantime_serde")]
    pub start_timeout: Duration,
    /// Probe interval while waiting for the game to appear.
    #[serde(with = "humantime_serde")]
    pub start_poll_interval: Duration,
    /// Probe interval while the game is running.
    #[serde(with = "humantime_serde")]
    pub run_poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_timeout: Duration::from_secs(60),
            start_poll_interval: Duration::from_secs(1),
            run_poll_interval: Duration::from_secs(5),
        }
    }
}

/// States of the launch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Idle,
    Launching,
    AwaitingStart,
    ShellSuspending,
    Monitoring,
    ShellRestoring,
    Done,
    Failed,
}

/// Terminal failure reasons. Shell-op failures are deliberately absent:
/// they are logged and degrade the status report, never the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum FailureReason {
    #[error("unknown edition")]
    NotFound,
    #[error("launch handler failed")]
    LaunchFailed,
    #[error("game process not observed within the start timeout")]
    StartTimeout,
    #[error("cancelled")]
    Cancelled,
    #[error("session aborted unexpectedly")]
    Aborted,
}

/// Snapshot taken once after the suspend attempt; drives the outcome table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub explorer_killed: bool,
    pub forza_started: bool,
}

impl StatusReport {
    /// The 2x2 outcome table. The literal messages are load-bearing for
    /// compatibility and must not change.
    pub fn classify(self) -> Outcome {
        match (self.explorer_killed, self.forza_started) {
            (true, true) => Outcome::Success,
            (true, false) => Outcome::LaunchFailure,
            (false, true) => Outcome::ShellRestoreFailure,
            (false, false) => Outcome::TotalFailure,
        }
    }
}

/// One of the four fixed terminal status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    LaunchFailure,
    ShellRestoreFailure,
    TotalFailure,
}

impl Outcome {
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Success => "Success",
            Outcome::LaunchFailure => "Launch failure",
            Outcome::ShellRestoreFailure => "Shell-restore failure",
            Outcome::TotalFailure => "Total failure",
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

/// What a finished session reports back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    pub report: StatusReport,
    pub reason: Option<FailureReason>,
}

impl SessionResult {
    pub fn completed(report: StatusReport) -> Self {
        Self {
            report,
            reason: None,
        }
    }

    pub fn failed(report: StatusReport, reason: FailureReason) -> Self {
        Self {
            report,
            reason: Some(reason),
        }
    }

    /// Terminal status for the session. Failures before the game was ever
    /// observed cannot be expressed by the 2x2 table (the shell was never
    /// touched), so they all surface as "Launch failure".
    pub fn outcome(&self) -> Outcome {
        match self.reason {
            Some(_) if !self.report.forza_started => Outcome::LaunchFailure,
            _ => self.report.classify(),
        }
    }
}

/// Events emitted by the lifecycle layers and consumed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LaunchEvent {
    StateChanged {
        state: LifecycleState,
    },
    /// Snapshot emitted once, right after the suspend attempt.
    InitialStatus {
        report: StatusReport,
    },
    /// Exactly one per session.
    Completed {
        outcome: Outcome,
        report: StatusReport,
        reason: Option<FailureReason>,
    },
}
