use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::Instant;

/// Termination state of a supervised child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    /// SIGTERM delivered; the child is force-killed at `kill_at` if still alive.
    SignalSent { kill_at: Instant },
    Exited,
    ForceKilled,
}

/// Owns one child process and walks it through `Lifecycle`.
///
/// The child is spawned with `kill_on_drop`, so dropping the handle on any
/// early return still reaps it.
pub struct Supervised {
    child: Child,
    lifecycle: Lifecycle,
}

impl Supervised {
    pub fn new(child: Child) -> Self {
        Self {
            child,
            lifecycle: Lifecycle::Running,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// When the grace window runs out, if a graceful stop is in progress.
    pub fn kill_deadline(&self) -> Option<Instant> {
        match self.lifecycle {
            Lifecycle::SignalSent { kill_at } => Some(kill_at),
            _ => None,
        }
    }

    /// Ask the child to stop. A zero grace, or a platform without SIGTERM,
    /// goes straight to the forced kill. Only acts on a running child.
    pub fn begin_termination(&mut self, grace: Duration) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        if grace.is_zero() || !send_sigterm(&self.child) {
            self.force_kill();
            return;
        }
        tracing::debug!(pid = ?self.child.id(), grace_ms = grace.as_millis() as u64, "sent SIGTERM");
        self.lifecycle = Lifecycle::SignalSent {
            kill_at: Instant::now() + grace,
        };
    }

    pub fn force_kill(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Exited | Lifecycle::ForceKilled) {
            return;
        }
        if let Err(e) = self.child.start_kill() {
            tracing::warn!(pid = ?self.child.id(), error = %e, "force kill failed");
        }
        tracing::debug!(pid = ?self.child.id(), "force killed");
        self.lifecycle = Lifecycle::ForceKilled;
    }

    /// Wait for exit. Cancel-safe, so it can sit in a `select!` loop.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        let status = self.child.wait().await?;
        if self.lifecycle != Lifecycle::ForceKilled {
            self.lifecycle = Lifecycle::Exited;
        }
        Ok(status)
    }
}

#[cfg(unix)]
fn send_sigterm(child: &Child) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return false;
    };
    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(pid, error = %e, "SIGTERM failed");
            false
        }
    }
}

#[cfg(not(unix))]
fn send_sigterm(_child: &Child) -> bool {
    false
}

/// Map an exit status to a shell-style code: the code itself, or 128+N for signal N.
pub fn normalize_exit(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            code
        } else if let Some(sig) = status.signal() {
            128 + sig
        } else {
            1
        }
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}
