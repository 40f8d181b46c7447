use tokio::sync::mpsc;

use codeagent_core::api::{LineStream, OutputSink};

/// Mirrors every subprocess line into the log at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn emit(&self, task_id: &str, stream: LineStream, line: &str) {
        tracing::debug!(
            target: "codeagent.output",
            task_id,
            stream = stream.label(),
            "{}",
            line
        );
    }
}

/// One line captured by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub task_id: String,
    pub stream: LineStream,
    pub line: String,
}

/// Forwards lines to an unbounded channel, e.g. for a push server.
///
/// Sends after the receiver is gone are dropped silently.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutputLine>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutputLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutputSink for ChannelSink {
    fn emit(&self, task_id: &str, stream: LineStream, line: &str) {
        let _ = self.tx.send(OutputLine {
            task_id: task_id.to_string(),
            stream,
            line: line.to_string(),
        });
    }
}
