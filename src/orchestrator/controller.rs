//! Session lifecycle controller.
//!
//! Owns launch/cancel orchestration, enforces the single-flight invariant,
//! and emits exactly one terminal `Completed` event per session.

use crate::launcher::LaunchHandler;
use crate::model::{
    FailureReason, LaunchEvent, LifecycleState, SessionConfig, SessionResult, StatusReport,
};
use crate::probe::ProcessProbe;
use crate::registry::EditionRegistry;
use crate::session::LaunchSession;
use crate::shell::ShellControl;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Commands emitted by UI layers to control the launcher.
#[derive(Debug, Clone)]
pub enum UiCommand {
    Launch(String),
    Cancel,
}

/// Everything a session needs, shared across launches.
pub struct ControllerDeps {
    pub registry: EditionRegistry,
    pub config: SessionConfig,
    pub probe: Arc<dyn ProcessProbe>,
    pub shell: Arc<dyn ShellControl>,
    pub launcher: Arc<dyn LaunchHandler>,
}

/// Internal handle for the active session task.
struct SessionCtx {
    cancel: CancellationToken,
    handle: Option<tokio::task::JoinHandle<SessionResult>>,
}

/// Spawn a session and return its control handle.
fn start_session(
    deps: &ControllerDeps,
    edition_id: &str,
    event_tx: UnboundedSender<LaunchEvent>,
) -> Option<SessionCtx> {
    let Some(edition) = deps.registry.lookup(edition_id) else {
        // Unknown edition is terminal and user-visible; the open handler and
        // the probe are never invoked for it.
        error!(edition = %edition_id, "unknown edition");
        let result = SessionResult::failed(StatusReport::default(), FailureReason::NotFound);
        let _ = event_tx.send(LaunchEvent::StateChanged {
            state: LifecycleState::Failed,
        });
        let _ = event_tx.send(LaunchEvent::Completed {
            outcome: result.outcome(),
            report: result.report,
            reason: result.reason,
        });
        return None;
    };

    let session = LaunchSession::new(
        edition.clone(),
        deps.config.clone(),
        deps.probe.clone(),
        deps.shell.clone(),
        deps.launcher.clone(),
    );
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move { session.run(event_tx, token).await });
    Some(SessionCtx {
        cancel,
        handle: Some(handle),
    })
}

/// Orchestrate launch sessions based on UI commands and emit events back to
/// presentation layers. Returns once the command channel closes and no
/// session is active.
pub async fn run_controller(
    deps: ControllerDeps,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
    event_tx: UnboundedSender<LaunchEvent>,
) -> Result<()> {
    let mut active: Option<SessionCtx> = None;
    let mut quit_pending = false;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Launch(id)) => {
                        if active.is_some() {
                            // Single-flight: a second request is ignored,
                            // never interleaved with the running session.
                            warn!(edition = %id, "launch ignored: a session is already active");
                        } else {
                            active = start_session(&deps, &id, event_tx.clone());
                        }
                    }
                    Some(UiCommand::Cancel) => {
                        quit_pending = true;
                        if let Some(ctx) = &active {
                            info!("cancelling active session");
                            ctx.cancel.cancel();
                        } else {
                            break Ok(());
                        }
                    }
                    None => {
                        quit_pending = true;
                        if let Some(ctx) = &active {
                            ctx.cancel.cancel();
                        } else {
                            break Ok(());
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it
            // can be dropped if another select branch is chosen, and we would
            // never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut active {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    if let Some(ctx) = &mut active {
                        ctx.handle.take();
                    }
                    let result = match join_res {
                        Ok(result) => result,
                        Err(err) => {
                            // A crashed session cannot tell us whether the
                            // shell was suspended. Restore is idempotent, so
                            // attempt it unconditionally to keep the pairing
                            // guarantee on this exit path too.
                            error!(%err, "session task failed");
                            if !deps.shell.restore() {
                                warn!("shell restore failed after aborted session");
                            }
                            SessionResult::failed(StatusReport::default(), FailureReason::Aborted)
                        }
                    };
                    let _ = event_tx.send(LaunchEvent::Completed {
                        outcome: result.outcome(),
                        report: result.report,
                        reason: result.reason,
                    });
                    active = None;
                    if quit_pending {
                        break Ok(());
                    }
                }
            }
        }
    }
}
