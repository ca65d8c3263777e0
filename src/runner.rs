//! Installer execution for MSI, EXE and AppX artifacts
//!
//! Dispatch is an exhaustive match on the catalog's `installer_kind`, so a
//! new installer technology is a compile-time-checked addition. The child
//! runs with stdin nulled (installers that prompt would otherwise hang) and
//! stdout/stderr piped; a non-zero exit surfaces as `InstallerFailed`
//! carrying the exit code and the tail of the combined output, never
//! silently ignored.
//!
//! Uninstall follows the same capture/timeout path but executes the
//! catalog's opaque `uninstall_command` through the platform shell.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::cancel::CancelToken;
use crate::catalog::{AppMetadata, InstallerKind};
use crate::error::{AppdeckError, Result};

/// Default timeout for one installer invocation (15 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

/// Granularity of the wait loop, bounding cancellation latency
const WAIT_SLICE: Duration = Duration::from_millis(200);

/// Lines of combined output kept when an installer fails
const OUTPUT_TAIL_LINES: usize = 20;

/// Executes installer binaries with silent arguments
pub struct InstallerRunner {
    timeout: Duration,
}

impl Default for InstallerRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallerRunner {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run an application's installer from a verified artifact
    pub fn run(
        &self,
        metadata: &AppMetadata,
        artifact: &Path,
        cancel: &CancelToken,
    ) -> Result<()> {
        let command = Self::installer_command(metadata, artifact);
        info!(
            app = %metadata.app_id,
            kind = metadata.installer_kind.as_str(),
            "running installer"
        );
        self.execute(&metadata.app_id, command, cancel)
    }

    /// Run the catalog's uninstall command for an application
    pub fn run_uninstall(&self, metadata: &AppMetadata, cancel: &CancelToken) -> Result<()> {
        let Some(command_line) = metadata.uninstall_command.as_deref() else {
            return Err(AppdeckError::UninstallFailed {
                app_id: metadata.app_id.clone(),
                reason: "catalog entry has no uninstall command".to_string(),
            });
        };

        info!(app = %metadata.app_id, "running uninstall command");
        self.execute(&metadata.app_id, Self::shell_command(command_line), cancel)
    }

    /// Build the installer invocation for an artifact
    ///
    /// Visible to tests: the dispatch itself is pure.
    fn installer_command(metadata: &AppMetadata, artifact: &Path) -> Command {
        match metadata.installer_kind {
            InstallerKind::Msi => {
                let mut cmd = Command::new("msiexec");
                cmd.arg("/i").arg(artifact).args(&metadata.silent_args);
                cmd
            }
            InstallerKind::Exe => {
                let mut cmd = Command::new(artifact);
                cmd.args(&metadata.silent_args);
                cmd
            }
            InstallerKind::Appx => {
                let mut cmd = Command::new("powershell");
                cmd.args([
                    "-NoProfile",
                    "-NonInteractive",
                    "-Command",
                    &format!("Add-AppxPackage -Path \"{}\"", artifact.display()),
                ]);
                cmd
            }
        }
    }

    /// Run an opaque command line through the platform shell
    fn shell_command(command_line: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command_line);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command_line);
            cmd
        }
    }

    fn execute(&self, app_id: &str, mut command: Command, cancel: &CancelToken) -> Result<()> {
        cancel.check()?;

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppdeckError::InstallerSpawnFailed {
                app_id: app_id.to_string(),
                reason: e.to_string(),
            })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AppdeckError::Cancelled);
            }

            match child.wait_timeout(WAIT_SLICE)? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(AppdeckError::InstallerTimedOut {
                        app_id: app_id.to_string(),
                        secs: self.timeout.as_secs(),
                    });
                }
                None => {}
            }
        };

        // Process has exited; collect remaining pipe contents
        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        for line in stdout.lines() {
            debug!(app = %app_id, "[installer] {line}");
        }
        for line in stderr.lines() {
            warn!(app = %app_id, "[installer] {line}");
        }

        if status.success() {
            info!(app = %app_id, "installer completed successfully");
            Ok(())
        } else {
            let code = status.code().unwrap_or(-1);
            let combined: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
            let tail_start = combined.len().saturating_sub(OUTPUT_TAIL_LINES);
            Err(AppdeckError::InstallerFailed {
                app_id: app_id.to_string(),
                code,
                output_tail: combined[tail_start..].join("\n"),
            })
        }
    }
}
