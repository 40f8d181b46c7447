use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::config::DependencyPolicy;
use crate::context::AppContext;
use crate::error::ExecutorError;
use crate::report;
use crate::runner::{run_process, Interrupt, ProcessOutcome, RunControl};

use super::graph::TaskGraph;
use super::output::{
    emit_execution_plan, emit_layer_end, emit_layer_start, emit_run_end, emit_run_start,
    emit_task_end, emit_task_skipped, emit_task_start,
};
use super::progress::ProgressMonitor;
use super::scheduler::execute_layer;
use super::traits::TaskPlanner;
use super::types::{ExecutionResult, RunReport, Task, EXIT_GENERAL_ERROR, EXIT_SUCCESS};

/// Runs a task set layer by layer under one global time budget.
pub struct ExecutionEngine<'a> {
    ctx: &'a AppContext,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Execute `tasks` in dependency order.
    ///
    /// Graph errors are returned before anything is planned or spawned. After
    /// that every task gets exactly one result, in task-set order, whether it
    /// ran, failed to plan, or never started.
    pub async fn execute(
        &self,
        tasks: &[Task],
        planner: &dyn TaskPlanner,
    ) -> Result<RunReport, ExecutorError> {
        let started_at = Instant::now();
        let cfg = &self.ctx.cfg().executor;
        let budget_end = started_at + Duration::from_secs(cfg.timeout_secs);

        let graph = TaskGraph::from_tasks(tasks)?;
        graph.validate()?;
        let layers = graph.layers()?;

        let run_id = Uuid::new_v4().to_string();
        let index: HashMap<&str, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();

        let mut slots: Vec<Option<ExecutionResult>> = vec![None; tasks.len()];
        // task id -> the failed dependency that blocks it (skip policy only)
        let mut blocked: HashMap<String, String> = HashMap::new();

        let progress = ProgressMonitor::new(tasks.len(), cfg.progress_bar);
        let cancel = self.ctx.cancel_token();

        emit_run_start(&run_id, tasks.len(), layers.len());
        emit_execution_plan(&run_id, &layers);

        for (layer_id, ids) in layers.iter().enumerate() {
            let now = Instant::now();
            let stop_reason = if cancel.is_cancelled() {
                Some("run interrupted before this task started")
            } else if now >= budget_end {
                Some("global timeout exhausted before this task started")
            } else {
                None
            };

            if let Some(reason) = stop_reason {
                for id in layers[layer_id..].iter().flatten() {
                    if let Some(&idx) = index.get(id.as_str()) {
                        emit_task_skipped(&run_id, id, reason);
                        progress.skip_task(id);
                        slots[idx] = Some(ExecutionResult::not_run(id, reason));
                    }
                }
                break;
            }

            let remaining = budget_end - now;
            emit_layer_start(&run_id, layer_id, ids);
            progress.update_layer(layer_id, layers.len());

            let mut runnable = Vec::with_capacity(ids.len());
            for id in ids {
                let Some(&idx) = index.get(id.as_str()) else {
                    continue;
                };
                match blocked.get(id) {
                    Some(dep) => {
                        let reason = format!("dependency '{dep}' did not succeed");
                        emit_task_skipped(&run_id, id, &reason);
                        progress.skip_task(id);
                        slots[idx] = Some(ExecutionResult::not_run(id, reason));
                    }
                    None => runnable.push(idx),
                }
            }

            let layer_results = execute_layer(&runnable, |idx| {
                self.run_task(&run_id, &tasks[idx], remaining, planner, &progress)
            })
            .await;

            let mut failed = 0;
            for (idx, result) in layer_results {
                if !result.is_success() {
                    failed += 1;
                    if cfg.on_dependency_failure == DependencyPolicy::Skip {
                        for dependent in graph.dependents_of(&result.task_id) {
                            blocked
                                .entry(dependent)
                                .or_insert_with(|| result.task_id.clone());
                        }
                    }
                }
                slots[idx] = Some(result);
            }
            emit_layer_end(&run_id, layer_id, failed);
        }

        let report_cfg = &self.ctx.cfg().report;
        let results: Vec<ExecutionResult> = slots
            .into_iter()
            .zip(tasks)
            .map(|(slot, task)| {
                let mut r =
                    slot.unwrap_or_else(|| ExecutionResult::not_run(&task.id, "task was not scheduled"));
                report::enrich_with(&mut r, report_cfg.coverage_target, report_cfg.key_output_chars);
                r
            })
            .collect();

        let report = RunReport {
            results,
            layers,
            duration_ms: started_at.elapsed().as_millis() as u64,
        };

        progress.finish(report.exit_code() == EXIT_SUCCESS);
        emit_run_end(&run_id, &report);
        Ok(report)
    }

    async fn run_task(
        &self,
        run_id: &str,
        task: &Task,
        remaining: Duration,
        planner: &dyn TaskPlanner,
        progress: &ProgressMonitor,
    ) -> ExecutionResult {
        let cfg = &self.ctx.cfg().executor;
        let limit = task
            .timeout
            .or(cfg.task_timeout_secs)
            .map(Duration::from_secs)
            .map_or(remaining, |t| t.min(remaining));

        emit_task_start(run_id, &task.id, task.backend.name(), limit.as_secs());
        progress.start_task(&task.id);
        let started_at = Instant::now();

        let result = match planner.plan(task) {
            Err(e) => {
                tracing::error!(task_id = %task.id, error.kind = "task.plan_failed", error.message = %e);
                ExecutionResult::failed(&task.id, e.exit_code(), e.to_string())
            }
            Ok(spec) => {
                let ctl = RunControl {
                    task_id: task.id.clone(),
                    deadline: started_at + limit,
                    grace: Duration::from_secs(cfg.force_kill_delay_secs),
                    cancel: self.ctx.cancel_token(),
                    sink: self.ctx.sink(),
                    stdout_capture_bytes: cfg.stdout_capture_bytes,
                    stderr_capture_bytes: cfg.stderr_capture_bytes,
                    line_channel_capacity: cfg.line_channel_capacity,
                };
                match run_process(spec, ctl).await {
                    Ok(outcome) => result_from_outcome(&task.id, outcome, limit),
                    Err(e) => {
                        tracing::error!(task_id = %task.id, error.kind = "task.spawn_failed", error.message = %e);
                        ExecutionResult::failed(&task.id, e.exit_code(), e.to_string())
                    }
                }
            }
        };

        let result = ExecutionResult {
            duration_ms: started_at.elapsed().as_millis() as u64,
            ..result
        };
        progress.complete_task(&task.id, result.exit_code, result.duration_ms);
        emit_task_end(run_id, &result);
        result
    }
}

fn result_from_outcome(task_id: &str, outcome: ProcessOutcome, limit: Duration) -> ExecutionResult {
    let mut exit_code = outcome.exit_code;
    let error = match outcome.interrupt {
        Some(Interrupt::Timeout) => Some(format!("timed out after {}s", limit.as_secs())),
        Some(Interrupt::Cancelled) => Some("interrupted".to_string()),
        None if exit_code != EXIT_SUCCESS => Some(format!("backend exited with code {exit_code}")),
        None if outcome.message.trim().is_empty() => {
            exit_code = EXIT_GENERAL_ERROR;
            Some("backend produced no output".to_string())
        }
        None => None,
    };

    ExecutionResult {
        task_id: task_id.to_string(),
        exit_code,
        message: outcome.message,
        session_id: outcome.session_id,
        error,
        stderr_tail: outcome.stderr_tail,
        duration_ms: outcome.duration_ms,
        ..Default::default()
    }
}

/// Execute `tasks` with a fresh engine over `ctx`.
pub async fn execute_tasks(
    ctx: &AppContext,
    tasks: &[Task],
    planner: &dyn TaskPlanner,
) -> Result<RunReport, ExecutorError> {
    ExecutionEngine::new(ctx).execute(tasks, planner).await
}
