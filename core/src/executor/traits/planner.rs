use crate::error::PlanError;
use crate::executor::types::Task;
use crate::runner::LaunchSpec;

/// Turns a task into a concrete process launch.
///
/// Called once per task right before it starts. A planning error becomes
/// that task's result; siblings are unaffected.
pub trait TaskPlanner: Send + Sync {
    fn plan(&self, task: &Task) -> Result<LaunchSpec, PlanError>;
}
