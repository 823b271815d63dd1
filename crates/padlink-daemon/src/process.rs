//! Emulator process lifecycle state machine.
//!
//! One controller instance exists per daemon and owns the only
//! authoritative handle to the emulator process. All operations serialise
//! on an internal async mutex, so two sessions issuing `start` at once
//! cannot race to launch two processes: the second caller blocks, then
//! observes Running and short-circuits.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use padlink_types::ProcessStatus;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::EmulatorConfig;

/// Lifecycle state of the emulator process handle.
///
/// `Starting` and `Stopping` exist only while the controller mutex is
/// held by the corresponding operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// No process is held or known to be running.
    Absent,
    /// A launch is in flight.
    Starting,
    /// A live handle is held.
    Running,
    /// A termination is in flight.
    Stopping,
}

impl ProcessState {
    /// Whether a lifecycle transition is currently in flight.
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new emulator process was launched.
    Launched,
    /// The emulator was already running; nothing was done.
    AlreadyRunning,
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The emulator was terminated (or had already exited by itself).
    Stopped,
    /// The emulator was not running; nothing was done.
    NotRunning,
}

/// Process lifecycle errors. Reported to clients via broadcast; never
/// fatal to the daemon.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Dolphin executable not found at {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("failed to launch Dolphin: {0}")]
    Launch(#[source] std::io::Error),

    #[error("failed to stop Dolphin: {0}")]
    Stop(String),
}

struct Inner {
    state: ProcessState,
    child: Option<Child>,
}

/// Governs start/stop/status of the emulator process.
pub struct ProcessController {
    executable: PathBuf,
    process_name: String,
    stop_grace: Duration,
    inner: Mutex<Inner>,
}

impl ProcessController {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            process_name: config.process_name.clone(),
            stop_grace: Duration::from_secs(config.stop_grace_secs),
            inner: Mutex::new(Inner {
                state: ProcessState::Absent,
                child: None,
            }),
        }
    }

    /// Authoritative liveness check.
    ///
    /// A held handle is polled directly (clearing it back to Absent if the
    /// process died behind our back). With no handle, falls back to a
    /// process-table scan keyed by the well-known executable name — the
    /// emulator may have been launched outside this daemon.
    pub async fn query_running(&self) -> bool {
        let mut inner = self.inner.lock().await;
        self.refresh(&mut inner).await
    }

    /// The status reported to clients.
    pub async fn status(&self) -> ProcessStatus {
        if self.query_running().await {
            ProcessStatus::Running
        } else {
            ProcessStatus::Stopped
        }
    }

    /// Current lifecycle state (for logs and tests).
    pub async fn state(&self) -> ProcessState {
        self.inner.lock().await.state
    }

    /// Launch the emulator unless it is already running.
    pub async fn start(&self) -> Result<StartOutcome, ProcessError> {
        let mut inner = self.inner.lock().await;
        if self.refresh(&mut inner).await {
            info!("Dolphin is already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        inner.state = ProcessState::Starting;
        info!(path = %self.executable.display(), "starting Dolphin");

        match Command::new(&self.executable)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                inner.child = Some(child);
                inner.state = ProcessState::Running;
                info!("Dolphin started");
                Ok(StartOutcome::Launched)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                inner.state = ProcessState::Absent;
                Err(ProcessError::ExecutableNotFound(self.executable.clone()))
            }
            Err(e) => {
                inner.state = ProcessState::Absent;
                Err(ProcessError::Launch(e))
            }
        }
    }

    /// Terminate the emulator unless it is not running.
    ///
    /// Requests a graceful exit first, waits up to the configured grace
    /// period, then escalates to a hard kill. The handle is cleared to
    /// Absent on every path out of here.
    pub async fn stop(&self) -> Result<StopOutcome, ProcessError> {
        let mut inner = self.inner.lock().await;
        if !self.refresh(&mut inner).await {
            info!("Dolphin is not running");
            return Ok(StopOutcome::NotRunning);
        }

        inner.state = ProcessState::Stopping;
        let Some(mut child) = inner.child.take() else {
            // Running externally: nothing we hold can be terminated.
            warn!("Dolphin is running but was not started by this relay; cannot stop it");
            inner.state = ProcessState::Absent;
            return Ok(StopOutcome::Stopped);
        };

        info!("stopping Dolphin");
        if let Some(pid) = child.id() {
            if let Err(e) = request_graceful_exit(pid).await {
                debug!(error = %e, "graceful termination request failed");
            }
        }

        let result = match tokio::time::timeout(self.stop_grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(%status, "Dolphin stopped");
                Ok(StopOutcome::Stopped)
            }
            Ok(Err(e)) => Err(ProcessError::Stop(e.to_string())),
            Err(_) => {
                warn!(grace = ?self.stop_grace, "Dolphin did not exit in time, killing");
                match child.kill().await {
                    Ok(()) => Ok(StopOutcome::Stopped),
                    Err(e) => Err(ProcessError::Stop(e.to_string())),
                }
            }
        };

        inner.state = ProcessState::Absent;
        result
    }

    /// Poll liveness, correcting stale state. Takes the already-locked
    /// inner so start/stop can check-then-act atomically.
    async fn refresh(&self, inner: &mut Inner) -> bool {
        if let Some(child) = &mut inner.child {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!(%status, "Dolphin exited outside our control");
                    inner.child = None;
                    inner.state = ProcessState::Absent;
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    warn!(error = %e, "could not poll Dolphin process");
                    true
                }
            }
        } else {
            match scan_process_table(&self.process_name).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(error = %e, "process table scan failed");
                    false
                }
            }
        }
    }
}

/// Look for a process by executable name in the OS process table.
async fn scan_process_table(name: &str) -> std::io::Result<bool> {
    if cfg!(windows) {
        let output = Command::new("tasklist")
            .args(["/FI", &format!("IMAGENAME eq {name}")])
            .output()
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).contains(name))
    } else {
        let output = Command::new("pgrep").args(["-x", name]).output().await?;
        Ok(!output.stdout.is_empty())
    }
}

/// Ask the process to exit gracefully (SIGTERM / taskkill).
async fn request_graceful_exit(pid: u32) -> std::io::Result<()> {
    if cfg!(windows) {
        Command::new("taskkill")
            .args(["/PID", &pid.to_string()])
            .output()
            .await?;
    } else {
        Command::new("kill")
            .args(["-TERM", &pid.to_string()])
            .output()
            .await?;
    }
    Ok(())
}
