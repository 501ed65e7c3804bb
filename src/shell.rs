//! Desktop shell suspension and restoration.

use tracing::{info, warn};

/// Opaque shell-control capability. Both operations are idempotent and
/// best-effort: the boolean is advisory, never an error. Every suspend on a
/// session must be paired with a restore attempt on that session's exit path.
pub trait ShellControl: Send + Sync {
    fn suspend(&self) -> bool;
    fn restore(&self) -> bool;
}

/// Shell control via external commands (`taskkill` / `explorer.exe` on the
/// target platform), exit status mapped to a boolean.
#[derive(Debug, Clone)]
pub struct CommandShell {
    suspend_cmd: Vec<String>,
    restore_cmd: Vec<String>,
}

impl CommandShell {
    pub fn new(
        suspend_cmd: impl IntoIterator<Item = impl Into<String>>,
        restore_cmd: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            suspend_cmd: suspend_cmd.into_iter().map(Into::into).collect(),
            restore_cmd: restore_cmd.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CommandShell {
    fn default() -> Self {
        Self::new(
            ["taskkill", "/f", "/im", "explorer.exe"],
            ["explorer.exe"],
        )
    }
}

impl ShellControl for CommandShell {
    fn suspend(&self) -> bool {
        let ok = run_command(&self.suspend_cmd);
        if ok {
            info!("desktop shell suspended");
        }
        ok
    }

    fn restore(&self) -> bool {
        let ok = run_command(&self.restore_cmd);
        if ok {
            info!("desktop shell restored");
        }
        ok
    }
}

/// Run an external command and map its exit status to a success flag.
/// Failures are logged here and never propagated.
fn run_command(cmd: &[String]) -> bool {
    let Some((program, args)) = cmd.split_first() else {
        warn!("empty shell command");
        return false;
    };
    match std::process::Command::new(program).args(args).status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!(%program, code = status.code(), "shell command exited with failure");
            false
        }
        Err(err) => {
            warn!(%program, %err, "failed to run shell command");
            false
        }
    }
}
