//! End-to-end lifecycle scenarios driven through the controller with
//! scripted stand-ins for the probe, shell, and launch handler.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use forza_launcher::launcher::LaunchHandler;
use forza_launcher::model::{
    FailureReason, LaunchEvent, Outcome, SessionConfig, StatusReport,
};
use forza_launcher::orchestrator::{run_controller, ControllerDeps, UiCommand};
use forza_launcher::probe::ProcessProbe;
use forza_launcher::registry::{EditionDescriptor, EditionRegistry};
use forza_launcher::shell::ShellControl;

struct ScriptedProbe {
    script: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    fn new(script: impl IntoIterator<Item = bool>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProcessProbe for ScriptedProbe {
    fn is_running(&self, _edition: &EditionDescriptor) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or(false)
    }
}

struct RecordingShell {
    suspend_result: bool,
    restore_result: bool,
    suspends: AtomicUsize,
    restores: AtomicUsize,
}

impl RecordingShell {
    fn new(suspend_result: bool, restore_result: bool) -> Arc<Self> {
        Arc::new(Self {
            suspend_result,
            restore_result,
            suspends: AtomicUsize::new(0),
            restores: AtomicUsize::new(0),
        })
    }

    fn suspends(&self) -> usize {
        self.suspends.load(Ordering::SeqCst)
    }

    fn restores(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }
}

impl ShellControl for RecordingShell {
    fn suspend(&self) -> bool {
        self.suspends.fetch_add(1, Ordering::SeqCst);
        self.suspend_result
    }

    fn restore(&self) -> bool {
        self.restores.fetch_add(1, Ordering::SeqCst);
        self.restore_result
    }
}

struct StubLauncher {
    result: bool,
    calls: AtomicUsize,
}

impl StubLauncher {
    fn new(result: bool) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LaunchHandler for StubLauncher {
    fn launch(&self, _edition: &EditionDescriptor) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
    }
}

struct Harness {
    probe: Arc<ScriptedProbe>,
    shell: Arc<RecordingShell>,
    launcher: Arc<StubLauncher>,
    cmd_tx: mpsc::UnboundedSender<UiCommand>,
    event_rx: mpsc::UnboundedReceiver<LaunchEvent>,
    controller: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn spawn_harness(
    probe: Arc<ScriptedProbe>,
    shell: Arc<RecordingShell>,
    launcher: Arc<StubLauncher>,
) -> Harness {
    let deps = ControllerDeps {
        registry: EditionRegistry::builtin(),
        config: SessionConfig::default(),
        probe: probe.clone(),
        shell: shell.clone(),
        launcher: launcher.clone(),
    };
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let controller = tokio::spawn(run_controller(deps, cmd_rx, event_tx));
    Harness {
        probe,
        shell,
        launcher,
        cmd_tx,
        event_rx,
        controller,
    }
}

impl Harness {
    /// Drain events until the terminal `Completed`.
    async fn wait_terminal(&mut self) -> (Outcome, StatusReport, Option<FailureReason>) {
        while let Some(ev) = self.event_rx.recv().await {
            if let LaunchEvent::Completed {
                outcome,
                report,
                reason,
            } = ev
            {
                return (outcome, report, reason);
            }
        }
        panic!("controller dropped the event channel without a terminal status");
    }

    /// Stop the controller and verify no second terminal notification was
    /// ever emitted.
    async fn shutdown(mut self) {
        drop(self.cmd_tx);
        self.controller
            .await
            .expect("controller task panicked")
            .expect("controller returned an error");
        while let Some(ev) = self.event_rx.recv().await {
            assert!(
                !matches!(ev, LaunchEvent::Completed { .. }),
                "duplicate terminal notification"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn scenario_a_clean_run() {
    // Start confirmed on the third poll, exit detected on the second
    // monitoring poll: five probe calls in total.
    let probe = ScriptedProbe::new([false, false, true, true, false]);
    let shell = RecordingShell::new(true, true);
    let launcher = StubLauncher::new(true);
    let mut h = spawn_harness(probe, shell, launcher);

    h.cmd_tx
        .send(UiCommand::Launch("Forza Horizon 5".into()))
        .unwrap();
    let (outcome, report, reason) = h.wait_terminal().await;

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(outcome.message(), "Success");
    assert!(report.explorer_killed);
    assert!(report.forza_started);
    assert_eq!(reason, None);
    assert_eq!(h.probe.calls(), 5);
    assert_eq!(h.shell.suspends(), 1);
    assert_eq!(h.shell.restores(), 1);
    assert_eq!(h.launcher.calls(), 1);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn scenario_b_start_timeout() {
    let probe = ScriptedProbe::new(std::iter::empty());
    let shell = RecordingShell::new(true, true);
    let launcher = StubLauncher::new(true);
    let mut h = spawn_harness(probe, shell, launcher);

    h.cmd_tx
        .send(UiCommand::Launch("Forza Horizon 5".into()))
        .unwrap();
    let (outcome, report, reason) = h.wait_terminal().await;

    assert_eq!(outcome, Outcome::LaunchFailure);
    assert_eq!(outcome.message(), "Launch failure");
    assert!(!report.explorer_killed);
    assert!(!report.forza_started);
    assert_eq!(reason, Some(FailureReason::StartTimeout));
    // One poll per second against the 60s deadline.
    assert_eq!(h.probe.calls(), 60);
    assert_eq!(h.shell.suspends(), 0);
    assert_eq!(h.shell.restores(), 0);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn scenario_c_suspend_failure_degrades_but_monitors() {
    let probe = ScriptedProbe::new([true, true, false]);
    let shell = RecordingShell::new(false, true);
    let launcher = StubLauncher::new(true);
    let mut h = spawn_harness(probe, shell, launcher);

    h.cmd_tx
        .send(UiCommand::Launch("Forza Horizon 5".into()))
        .unwrap();
    let (outcome, report, reason) = h.wait_terminal().await;

    assert_eq!(outcome, Outcome::ShellRestoreFailure);
    assert_eq!(outcome.message(), "Shell-restore failure");
    assert!(!report.explorer_killed);
    assert!(report.forza_started);
    assert_eq!(reason, None);
    assert_eq!(h.shell.suspends(), 1);
    assert_eq!(h.shell.restores(), 1);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_edition_never_invokes_handler_or_probe() {
    let probe = ScriptedProbe::new(std::iter::empty());
    let shell = RecordingShell::new(true, true);
    let launcher = StubLauncher::new(true);
    let mut h = spawn_harness(probe, shell, launcher);

    h.cmd_tx
        .send(UiCommand::Launch("Gran Turismo 7".into()))
        .unwrap();
    let (outcome, _report, reason) = h.wait_terminal().await;

    assert_eq!(outcome, Outcome::LaunchFailure);
    assert_eq!(reason, Some(FailureReason::NotFound));
    assert_eq!(h.launcher.calls(), 0);
    assert_eq!(h.probe.calls(), 0);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn launch_trigger_failure_never_suspends() {
    let probe = ScriptedProbe::new(std::iter::empty());
    let shell = RecordingShell::new(true, true);
    let launcher = StubLauncher::new(false);
    let mut h = spawn_harness(probe, shell, launcher);

    h.cmd_tx
        .send(UiCommand::Launch("Forza Horizon 4".into()))
        .unwrap();
    let (outcome, _report, reason) = h.wait_terminal().await;

    assert_eq!(outcome, Outcome::LaunchFailure);
    assert_eq!(reason, Some(FailureReason::LaunchFailed));
    assert_eq!(h.launcher.calls(), 1);
    assert_eq!(h.shell.suspends(), 0);
    assert_eq!(h.shell.restores(), 0);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn aborted_session_still_restores_the_shell() {
    // Confirms start once, then blows up during monitoring, crashing the
    // session task after the shell was suspended.
    struct VanishingProbe {
        calls: AtomicUsize,
    }

    impl ProcessProbe for VanishingProbe {
        fn is_running(&self, _edition: &EditionDescriptor) -> bool {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                true
            } else {
                panic!("process table unavailable");
            }
        }
    }

    let shell = RecordingShell::new(true, true);
    let launcher = StubLauncher::new(true);
    let deps = ControllerDeps {
        registry: EditionRegistry::builtin(),
        config: SessionConfig::default(),
        probe: Arc::new(VanishingProbe {
            calls: AtomicUsize::new(0),
        }),
        shell: shell.clone(),
        launcher: launcher.clone(),
    };
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let controller = tokio::spawn(run_controller(deps, cmd_rx, event_tx));

    cmd_tx
        .send(UiCommand::Launch("Forza Horizon 5".into()))
        .unwrap();

    let mut terminal = None;
    while let Some(ev) = event_rx.recv().await {
        if let LaunchEvent::Completed {
            outcome, reason, ..
        } = ev
        {
            terminal = Some((outcome, reason));
            break;
        }
    }
    let (outcome, reason) = terminal.expect("no terminal status after session crash");

    assert_eq!(reason, Some(FailureReason::Aborted));
    assert_eq!(outcome, Outcome::LaunchFailure);
    // Pairing law: the suspend that happened before the crash still gets
    // exactly one restore attempt.
    assert_eq!(shell.suspends(), 1);
    assert_eq!(shell.restores(), 1);

    drop(cmd_tx);
    controller
        .await
        .expect("controller task panicked")
        .expect("controller returned an error");
}

#[tokio::test(start_paused = true)]
async fn second_restore_failure_does_not_alter_a_done_session() {
    // Restore fails; the session still completes and classifies from the
    // suspend-time snapshot.
    let probe = ScriptedProbe::new([true, false]);
    let shell = RecordingShell::new(true, false);
    let launcher = StubLauncher::new(true);
    let mut h = spawn_harness(probe, shell, launcher);

    h.cmd_tx
        .send(UiCommand::Launch("Forza Horizon 5".into()))
        .unwrap();
    let (outcome, report, reason) = h.wait_terminal().await;

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(reason, None);
    assert_eq!(h.shell.restores(), 1);

    // A second restore neither panics nor changes the already-reported
    // terminal status.
    assert!(!h.shell.restore());
    assert_eq!(h.shell.restores(), 2);
    assert_eq!(report.classify(), Outcome::Success);

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn second_launch_is_ignored_and_cancel_restores_once() {
    // Game starts immediately and never exits on its own; the session only
    // ends because of the cancel.
    let probe = ScriptedProbe::new(std::iter::repeat(true).take(256));
    let shell = RecordingShell::new(true, true);
    let launcher = StubLauncher::new(true);
    let mut h = spawn_harness(probe, shell, launcher);

    h.cmd_tx
        .send(UiCommand::Launch("Forza Motorsport".into()))
        .unwrap();

    // Wait until the shell has been suspended, then try to start a second
    // session and cancel everything.
    while let Some(ev) = h.event_rx.recv().await {
        if matches!(ev, LaunchEvent::InitialStatus { .. }) {
            break;
        }
    }
    h.cmd_tx
        .send(UiCommand::Launch("Forza Horizon 5".into()))
        .unwrap();
    h.cmd_tx.send(UiCommand::Cancel).unwrap();

    let (outcome, report, reason) = h.wait_terminal().await;

    // Pairing law: the suspend got exactly one restore despite the cancel.
    assert_eq!(h.shell.suspends(), 1);
    assert_eq!(h.shell.restores(), 1);
    // Single-flight: the second request never reached the launch handler.
    assert_eq!(h.launcher.calls(), 1);
    assert_eq!(reason, Some(FailureReason::Cancelled));
    assert!(report.forza_started);
    assert_eq!(outcome, Outcome::Success);

    // Cancel doubles as quit: the controller exits on its own.
    h.controller
        .await
        .expect("controller task panicked")
        .expect("controller returned an error");
    drop(h.cmd_tx);
    while let Some(ev) = h.event_rx.recv().await {
        assert!(
            !matches!(ev, LaunchEvent::Completed { .. }),
            "duplicate terminal notification"
        );
    }
}
