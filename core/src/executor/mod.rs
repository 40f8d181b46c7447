//! Dependency-ordered task executor.
//!
//! ```text
//! Vec<Task>
//!   ↓
//! TaskGraph::from_tasks() → validate() → layers()
//!   ↓
//! ExecutionEngine::execute() → one layer at a time, tasks of a layer concurrently
//!   ↓
//! RunReport (results in task-set order)
//! ```

mod engine;
mod graph;
mod output;
mod progress;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::{execute_tasks, ExecutionEngine};
pub use graph::{resolve_layers, TaskGraph};
pub use progress::ProgressMonitor;
pub use scheduler::execute_layer;
pub use traits::TaskPlanner;
pub use types::{ExecutionResult, RunReport, Task, TaskMode};
