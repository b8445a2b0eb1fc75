//! Ownership of spawned external processes.
//!
//! A [`ProcessHandle`] wraps exactly one OS process from spawn until it has been
//! reaped. [`ProcessLauncher`] is the seam the controller spawns through, so
//! tests can substitute processes that never touch the OS.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use crate::error::{PlayerError, Result};
use crate::process::command::{CommandSpec, Diagnostics};

/// Readable stderr of a running process.
pub type DiagnosticStream = Box<dyn AsyncRead + Send + Unpin>;

/// Result of a command run to completion.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

#[async_trait]
pub trait ProcessHandle: Send {
    /// OS process id while the process is running.
    fn id(&self) -> Option<u32>;

    /// Hand out the diagnostics stream. Returns `None` after the first call
    /// or when stderr was not captured.
    fn take_diagnostics(&mut self) -> Option<DiagnosticStream>;

    /// Whether `pause`/`resume` can work for this process.
    fn supports_suspend(&self) -> bool;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    /// Ask the process to exit, escalating to a kill after `grace`.
    ///
    /// Returns only once the process has exited. Calling it again is a no-op.
    async fn terminate(&mut self, grace: Duration);
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>>;

    /// Run a short-lived command and wait for it to finish.
    async fn run(&self, spec: &CommandSpec) -> Result<RunOutput>;
}

/// Launcher backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);
        match spec.diagnostics {
            Diagnostics::Capture => cmd.stderr(Stdio::piped()),
            Diagnostics::Inherit => cmd.stderr(Stdio::inherit()),
        };

        let child = cmd.spawn().map_err(|source| PlayerError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        tracing::info!("Spawned {} process (pid {:?}): {}", spec.role, child.id(), spec);

        Ok(Box::new(ChildProcess::new(child)))
    }

    async fn run(&self, spec: &CommandSpec) -> Result<RunOutput> {
        tracing::debug!("Running {}: {}", spec.role, spec);
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| PlayerError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        Ok(RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// A real child process.
pub struct ChildProcess {
    child: Child,
    suspended: bool,
    exit: Option<ExitStatus>,
}

impl ChildProcess {
    pub fn new(child: Child) -> Self {
        Self {
            child,
            suspended: false,
            exit: None,
        }
    }

    /// Exit status once reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit
    }

    fn has_exited(&mut self) -> bool {
        if self.exit.is_some() {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit = Some(status);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Cannot poll process {:?}: {}", self.child.id(), e);
                false
            }
        }
    }

    async fn kill(&mut self) {
        match self.child.kill().await {
            Ok(()) => {}
            Err(e) => tracing::error!("Failed to kill process {:?}: {}", self.child.id(), e),
        }
        match self.child.wait().await {
            Ok(status) => self.exit = Some(status),
            Err(e) => tracing::error!("Failed to reap process: {}", e),
        }
    }
}

#[cfg(unix)]
mod signals {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    use crate::error::{PlayerError, Result};

    pub fn send(pid: u32, signal: Signal) -> Result<()> {
        let raw = i32::try_from(pid)
            .map_err(|_| PlayerError::Signal(format!("pid {pid} out of range")))?;
        kill(Pid::from_raw(raw), signal)
            .map_err(|e| PlayerError::Signal(format!("{signal:?} to pid {pid}: {e}")))
    }
}

#[async_trait]
impl ProcessHandle for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn take_diagnostics(&mut self) -> Option<DiagnosticStream> {
        self.child
            .stderr
            .take()
            .map(|stderr| Box::new(stderr) as DiagnosticStream)
    }

    fn supports_suspend(&self) -> bool {
        cfg!(unix)
    }

    #[cfg(unix)]
    fn pause(&mut self) -> Result<()> {
        let pid = self.child.id().ok_or(PlayerError::NoActiveProcess)?;
        signals::send(pid, nix::sys::signal::Signal::SIGSTOP)?;
        self.suspended = true;
        Ok(())
    }

    #[cfg(not(unix))]
    fn pause(&mut self) -> Result<()> {
        Err(PlayerError::NotSupported("pause"))
    }

    #[cfg(unix)]
    fn resume(&mut self) -> Result<()> {
        let pid = self.child.id().ok_or(PlayerError::NoActiveProcess)?;
        signals::send(pid, nix::sys::signal::Signal::SIGCONT)?;
        self.suspended = false;
        Ok(())
    }

    #[cfg(not(unix))]
    fn resume(&mut self) -> Result<()> {
        Err(PlayerError::NotSupported("resume"))
    }

    async fn terminate(&mut self, grace: Duration) {
        if self.has_exited() {
            return;
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::Signal;

            if let Some(pid) = self.child.id() {
                if let Err(e) = signals::send(pid, Signal::SIGTERM) {
                    tracing::warn!("{}", e);
                }
                // A stopped process only acts on TERM once continued.
                if self.suspended {
                    if let Err(e) = signals::send(pid, Signal::SIGCONT) {
                        tracing::warn!("{}", e);
                    }
                    self.suspended = false;
                }
            }

            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::debug!("Process exited with {}", status);
                    self.exit = Some(status);
                    return;
                }
                Ok(Err(e)) => tracing::error!("Failed to wait for process: {}", e),
                Err(_) => tracing::warn!(
                    "Process {:?} still alive after {:?}, killing",
                    self.child.id(),
                    grace
                ),
            }
        }

        #[cfg(not(unix))]
        let _ = grace;

        self.kill().await;
    }
}
