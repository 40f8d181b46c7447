//! Structured tracing events for a run. Field names are stable so log
//! consumers can filter on `run_id`, `task_id` and `layer`.

use super::types::{ExecutionResult, RunReport};

pub fn emit_run_start(run_id: &str, total_tasks: usize, total_layers: usize) {
    tracing::info!(run_id, total_tasks, total_layers, "run.start");
}

pub fn emit_execution_plan(run_id: &str, layers: &[Vec<String>]) {
    for (layer, ids) in layers.iter().enumerate() {
        tracing::debug!(run_id, layer, tasks = %ids.join(", "), "run.plan");
    }
}

pub fn emit_layer_start(run_id: &str, layer: usize, task_ids: &[String]) {
    tracing::info!(run_id, layer, tasks = task_ids.len(), "layer.start");
}

pub fn emit_layer_end(run_id: &str, layer: usize, failed: usize) {
    tracing::info!(run_id, layer, failed, "layer.end");
}

pub fn emit_task_start(run_id: &str, task_id: &str, backend: &str, timeout_secs: u64) {
    tracing::info!(run_id, task_id, backend, timeout_secs, "task.start");
}

pub fn emit_task_end(run_id: &str, result: &ExecutionResult) {
    if result.is_success() {
        tracing::info!(
            run_id,
            task_id = %result.task_id,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            "task.end"
        );
    } else {
        tracing::error!(
            run_id,
            task_id = %result.task_id,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            error.kind = "task.failed",
            error.message = result.error.as_deref().unwrap_or(""),
            "task.end"
        );
    }
}

pub fn emit_task_skipped(run_id: &str, task_id: &str, reason: &str) {
    tracing::warn!(run_id, task_id, reason, error.kind = "task.not_run", "task.skipped");
}

pub fn emit_run_end(run_id: &str, report: &RunReport) {
    tracing::info!(
        run_id,
        total_tasks = report.results.len(),
        failed = report.failed(),
        exit_code = report.exit_code(),
        duration_ms = report.duration_ms,
        "run.end"
    );
}
