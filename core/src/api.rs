//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `codeagent_core::api` instead of reaching into internal modules.

pub use crate::backend::{Backend, BackendArgs, STDIN_SENTINEL};
pub use crate::config::{
    apply_env_overrides, get_codeagent_data_dir, load_default, load_from_path, AppConfig,
    BackendConfig, DependencyPolicy, ExecutorConfig, LoggingConfig, ReportConfig,
};
pub use crate::context::AppContext;
pub use crate::error::{
    CliError, ConfigError, ExecutorError, InputError, PlanError, RunnerError,
};
pub use crate::executor::types::{
    overall_exit_code, ExecutionResult, RunReport, Task, TaskMode, EXIT_GENERAL_ERROR,
    EXIT_INTERRUPTED, EXIT_NOT_FOUND, EXIT_NOT_RUN, EXIT_SUCCESS, EXIT_TIMEOUT,
};
pub use crate::executor::{
    execute_tasks, resolve_layers, ExecutionEngine, TaskGraph, TaskPlanner,
};
pub use crate::input::{generate_task_id, parse_task_document};
pub use crate::report::{enrich, enrich_with, render_report, ReportMode, TaskStatus};
pub use crate::runner::{
    run_process, Interrupt, LaunchSpec, LineStream, NullSink, OutputSink, ProcessOutcome,
    RunControl,
};
