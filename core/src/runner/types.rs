use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::output::OutputSink;
use super::supervise::Lifecycle;

/// Everything needed to spawn one backend process.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    pub cmd: String,
    pub args: Vec<String>,
    /// Working directory of the child. `None` inherits ours.
    pub cwd: Option<PathBuf>,
    pub envs: HashMap<String, String>,
    /// Written to the child's stdin, which is then closed. `None` gives the child a null stdin.
    pub stdin_payload: Option<String>,
}

impl LaunchSpec {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ..Default::default()
        }
    }

    /// Command line for logs. Arguments are not quoted.
    pub fn display_command(&self) -> String {
        let mut s = self.cmd.clone();
        for arg in &self.args {
            s.push(' ');
            if arg.is_empty() {
                s.push_str("\"\"");
            } else {
                s.push_str(arg);
            }
        }
        s
    }
}

/// Per-task supervision parameters handed down by the executor.
#[derive(Clone)]
pub struct RunControl {
    pub task_id: String,
    pub deadline: Instant,
    /// Delay between SIGTERM and the forced kill.
    pub grace: Duration,
    pub cancel: CancellationToken,
    pub sink: Arc<dyn OutputSink>,
    pub stdout_capture_bytes: usize,
    pub stderr_capture_bytes: usize,
    pub line_channel_capacity: usize,
}

/// Why the supervisor stopped a child early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    pub message: String,
    pub session_id: Option<String>,
    pub stderr_tail: String,
    pub duration_ms: u64,
    pub interrupt: Option<Interrupt>,
    pub lifecycle: Lifecycle,
}
