use thiserror::Error;

/// Task graph errors. They are configuration errors: the run stops before any spawn.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("Dependency not found: task '{task_id}' depends on '{missing_dep}'")]
    DependencyNotFound {
        task_id: String,
        missing_dep: String,
    },

    #[error("Task '{0}' depends on itself")]
    SelfDependency(String),

    #[error("Circular dependency detected: {}", .ids.join(" -> "))]
    CircularDependency { ids: Vec<String> },
}
