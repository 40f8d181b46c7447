use std::fmt::Write as _;

use crate::executor::types::ExecutionResult;

use super::extract::truncate_chars;

/// How much of each task's output goes into the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Derived fields only.
    #[default]
    Compact,
    /// Derived fields plus the full agent message and stderr tail.
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pass,
    /// Succeeded, but coverage is under the target.
    Warn,
    Fail,
    NotRun,
}

impl TaskStatus {
    pub fn of(result: &ExecutionResult) -> Self {
        if result.is_not_run() {
            return TaskStatus::NotRun;
        }
        if !result.is_success() {
            return TaskStatus::Fail;
        }
        match result.coverage_num {
            Some(c) if c < result.coverage_target => TaskStatus::Warn,
            _ => TaskStatus::Pass,
        }
    }

    pub fn glyph(&self, ascii: bool) -> &'static str {
        match (self, ascii) {
            (TaskStatus::Pass, false) => "✓",
            (TaskStatus::Warn, false) => "⚠",
            (TaskStatus::Fail, false) => "✗",
            (TaskStatus::NotRun, false) => "○",
            (TaskStatus::Pass, true) => "PASS",
            (TaskStatus::Warn, true) => "WARN",
            (TaskStatus::Fail, true) => "FAIL",
            (TaskStatus::NotRun, true) => "SKIP",
        }
    }
}

const STDERR_LINES: usize = 5;

/// Human-readable report for a whole run, results in task-set order.
pub fn render_report(results: &[ExecutionResult], mode: ReportMode, ascii: bool) -> String {
    let mut out = String::new();

    let total = results.len();
    let count = |s: TaskStatus| results.iter().filter(|r| TaskStatus::of(r) == s).count();
    let passed = count(TaskStatus::Pass) + count(TaskStatus::Warn);
    let failed = count(TaskStatus::Fail);
    let not_run = count(TaskStatus::NotRun);
    let below = count(TaskStatus::Warn);

    let _ = writeln!(out, "=== Execution Report ===");
    let _ = write!(out, "{total} tasks | {passed} passed | {failed} failed");
    if not_run > 0 {
        let _ = write!(out, " | {not_run} not run");
    }
    out.push('\n');
    if below > 0 {
        let _ = writeln!(out, "{below} below coverage target");
    }

    out.push_str("\n## Task Results\n");

    for r in results {
        out.push('\n');
        render_task(&mut out, r, mode, ascii);
    }

    out.trim_end().to_string()
}

fn render_task(out: &mut String, r: &ExecutionResult, mode: ReportMode, ascii: bool) {
    let status = TaskStatus::of(r);

    let _ = write!(out, "### {} {}", r.task_id, status.glyph(ascii));
    if !r.coverage.is_empty() {
        let _ = write!(out, " {}", r.coverage);
    }
    match status {
        TaskStatus::Fail => {
            let _ = write!(out, " (exit {})", r.exit_code);
        }
        TaskStatus::Warn => {
            let _ = write!(out, " (target {}%)", format_target(r.coverage_target));
        }
        _ => {}
    }
    let _ = writeln!(out, " [{}ms]", r.duration_ms);

    if !r.key_output.is_empty() {
        let _ = writeln!(out, "Did: {}", r.key_output);
    }
    if !r.files_changed.is_empty() {
        let _ = writeln!(out, "Files: {}", r.files_changed.join(", "));
    }
    if r.tests_passed > 0 || r.tests_failed > 0 {
        let _ = writeln!(
            out,
            "Tests: {} passed, {} failed",
            r.tests_passed, r.tests_failed
        );
    }
    if let Some(sid) = &r.session_id {
        let _ = writeln!(out, "Session: {sid}");
    }
    if let Some(err) = &r.error {
        let _ = writeln!(out, "Error: {}", truncate_chars(err, 300));
    }

    match mode {
        ReportMode::Compact => {
            if status == TaskStatus::Fail {
                if let Some(last) = r.stderr_tail.lines().rev().find(|l| !l.trim().is_empty()) {
                    let _ = writeln!(out, "Stderr: {}", truncate_chars(last.trim(), 200));
                }
            }
        }
        ReportMode::Verbose => {
            if !r.message.is_empty() {
                let _ = writeln!(out, "\nOutput:\n{}", r.message.trim_end());
            }
            if !r.stderr_tail.is_empty() {
                let tail: Vec<&str> = r.stderr_tail.lines().collect();
                let start = tail.len().saturating_sub(STDERR_LINES);
                let _ = writeln!(out, "\nStderr (tail):\n{}", tail[start..].join("\n"));
            }
        }
    }
}

fn format_target(target: f64) -> String {
    if target.fract() == 0.0 {
        format!("{target:.0}")
    } else {
        format!("{target}")
    }
}
