use super::io_pump::LineStream;

/// Receives every line a task's subprocess writes.
///
/// Emission is fire-and-forget: implementations must not block the pump and
/// have no way to fail the task.
pub trait OutputSink: Send + Sync {
    fn emit(&self, task_id: &str, stream: LineStream, line: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&self, _task_id: &str, _stream: LineStream, _line: &str) {}
}
