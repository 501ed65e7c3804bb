//! Launch trigger: hands the edition's launch token to the platform URI opener.

use crate::registry::EditionDescriptor;
use std::process::ExitStatus;
use tracing::{error, info};

/// Opaque open-handler capability. Never retries; retry policy (there is
/// none) belongs to the lifecycle controller.
pub trait LaunchHandler: Send + Sync {
    fn launch(&self, edition: &EditionDescriptor) -> bool;
}

/// Opens the launch token through the platform URI handler, which forwards
/// `steam://rungameid/...` tokens to the store client.
#[derive(Debug, Default)]
pub struct UriLaunchHandler;

impl UriLaunchHandler {
    pub fn new() -> Self {
        Self
    }
}

impl LaunchHandler for UriLaunchHandler {
    fn launch(&self, edition: &EditionDescriptor) -> bool {
        match open_uri(&edition.launch_token) {
            Ok(status) if status.success() => {
                info!(edition = %edition.id, token = %edition.launch_token, "launch request dispatched");
                true
            }
            Ok(status) => {
                error!(edition = %edition.id, code = status.code(), "URI opener exited with failure");
                false
            }
            Err(err) => {
                error!(edition = %edition.id, %err, "failed to invoke URI opener");
                false
            }
        }
    }
}

#[cfg(windows)]
fn open_uri(uri: &str) -> std::io::Result<ExitStatus> {
    // `start` needs an explicit (empty) window title when the argument is quoted.
    std::process::Command::new("cmd")
        .args(["/C", "start", "", uri])
        .status()
}

#[cfg(not(windows))]
fn open_uri(uri: &str) -> std::io::Result<ExitStatus> {
    std::process::Command::new("xdg-open").arg(uri).status()
}
