use crate::launcher::UriLaunchHandler;
use crate::model::{FailureReason, LaunchEvent, Outcome, SessionConfig, StatusReport};
use crate::orchestrator::{run_controller, ControllerDeps, UiCommand};
use crate::probe::SystemProbe;
use crate::registry::EditionRegistry;
use crate::shell::CommandShell;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "forza-launcher",
    version,
    about = "Launch a Forza edition, suspend the desktop shell while it runs, restore it on exit"
)]
pub struct Cli {
    /// Edition to launch (see --list-editions)
    #[arg(long, short)]
    pub edition: Option<String>,

    /// List known editions and exit
    #[arg(long)]
    pub list_editions: bool,

    /// How long to wait for the game process to appear
    #[arg(long, default_value = "60s")]
    pub start_timeout: humantime::Duration,

    /// Probe interval while waiting for the game to appear
    #[arg(long, default_value = "1s")]
    pub start_poll_interval: humantime::Duration,

    /// Probe interval while the game is running
    #[arg(long, default_value = "5s")]
    pub run_poll_interval: humantime::Duration,

    /// Print the terminal report as JSON instead of the status line
    #[arg(long)]
    pub json: bool,
}

/// Build a `SessionConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> SessionConfig {
    SessionConfig {
        start_timeout: Duration::from(args.start_timeout),
        start_poll_interval: Duration::from(args.start_poll_interval),
        run_poll_interval: Duration::from(args.run_poll_interval),
    }
}

/// Terminal report shape for `--json` consumers.
#[derive(Debug, Serialize)]
struct JsonReport {
    status: &'static str,
    explorer_killed: bool,
    forza_started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub async fn run(args: Cli) -> Result<Outcome> {
    let registry = EditionRegistry::builtin();

    if args.list_editions {
        for id in registry.ids() {
            println!("{id}");
        }
        return Ok(Outcome::Success);
    }

    let edition = args
        .edition
        .clone()
        .context("no edition given; use --edition or --list-editions")?;

    let deps = ControllerDeps {
        registry,
        config: build_config(&args),
        probe: Arc::new(SystemProbe::new()),
        shell: Arc::new(CommandShell::default()),
        launcher: Arc::new(UriLaunchHandler::new()),
    };

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<LaunchEvent>();
    let controller = tokio::spawn(run_controller(deps, cmd_rx, event_tx));

    // Forward Ctrl-C as a cancel so the shell is restored before exit.
    let cancel_tx = cmd_tx.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            let _ = cancel_tx.send(UiCommand::Cancel);
        }
    });

    cmd_tx
        .send(UiCommand::Launch(edition))
        .context("controller command channel closed before launch")?;

    let mut terminal: Option<(Outcome, StatusReport, Option<FailureReason>)> = None;
    while let Some(ev) = event_rx.recv().await {
        match ev {
            LaunchEvent::StateChanged { state } => {
                info!(?state, "lifecycle");
            }
            LaunchEvent::InitialStatus { report } => {
                // The classified status is surfaced as soon as the launch
                // phase finishes; stdout keeps the single terminal line.
                info!(
                    explorer_killed = report.explorer_killed,
                    forza_started = report.forza_started,
                    status = report.classify().message(),
                    "launch phase finished"
                );
            }
            LaunchEvent::Completed {
                outcome,
                report,
                reason,
            } => {
                terminal = Some((outcome, report, reason));
                break;
            }
        }
    }

    // The signal listener holds a command-channel clone; abort it so the
    // controller observes the channel closing and exits.
    signal_task.abort();
    drop(cmd_tx);
    controller.await.context("controller task failed")??;

    let (outcome, report, reason) =
        terminal.context("controller exited without a terminal status")?;
    if let Some(reason) = reason {
        warn!(%reason, "session did not complete normally");
    }

    if args.json {
        let out = serde_json::to_string_pretty(&JsonReport {
            status: outcome.message(),
            explorer_killed: report.explorer_killed,
            forza_started: report.forza_started,
            reason: reason.map(|r| r.to_string()),
        })?;
        println!("{out}");
    } else {
        println!("Status: {}", outcome.message());
    }

    Ok(outcome)
}
