use serde::Serialize;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERAL_ERROR: i32 = 1;
pub const EXIT_TIMEOUT: i32 = 124;
pub const EXIT_NOT_FOUND: i32 = 127;
pub const EXIT_INTERRUPTED: i32 = 130;
/// The task was never attempted.
pub const EXIT_NOT_RUN: i32 = -1;

/// Result of executing a single task
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResult {
    pub task_id: String,

    /// Exit code (0 = success, -1 = not run, 128+N = killed by signal N)
    pub exit_code: i32,

    /// Agent message extracted from the backend output
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Last bytes written to stderr
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr_tail: String,

    pub duration_ms: u64,

    // Filled by `report::enrich`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub coverage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_num: Option<f64>,
    pub files_changed: Vec<String>,
    pub tests_passed: u32,
    pub tests_failed: u32,
    pub key_output: String,
    pub coverage_target: f64,
}

impl ExecutionResult {
    pub fn not_run(task_id: &str, reason: impl Into<String>) -> Self {
        Self {
            task_id: task_id.to_string(),
            exit_code: EXIT_NOT_RUN,
            error: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn failed(task_id: &str, exit_code: i32, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.to_string(),
            exit_code,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }

    pub fn is_not_run(&self) -> bool {
        self.exit_code == EXIT_NOT_RUN
    }
}

/// Results of a whole run, in task-set order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub results: Vec<ExecutionResult>,

    /// Execution layers (for debugging)
    pub layers: Vec<Vec<String>>,

    pub duration_ms: u64,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        overall_exit_code(&self.results)
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

/// First nonzero exit code in task-set order, else 0.
pub fn overall_exit_code(results: &[ExecutionResult]) -> i32 {
    results
        .iter()
        .map(|r| r.exit_code)
        .find(|&code| code != EXIT_SUCCESS)
        .unwrap_or(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_code(id: &str, code: i32) -> ExecutionResult {
        ExecutionResult {
            task_id: id.into(),
            exit_code: code,
            ..Default::default()
        }
    }

    #[test]
    fn overall_exit_code_is_first_nonzero_in_order() {
        let results = vec![with_code("a", 0), with_code("b", 124), with_code("c", 1)];
        assert_eq!(overall_exit_code(&results), 124);
        assert_eq!(overall_exit_code(&[with_code("a", 0)]), 0);
        assert_eq!(overall_exit_code(&[]), 0);
    }

    #[test]
    fn not_run_result_carries_reason() {
        let r = ExecutionResult::not_run("x", "global timeout exhausted");
        assert!(r.is_not_run());
        assert!(r.message.is_empty());
        assert_eq!(r.error.as_deref(), Some("global timeout exhausted"));
        assert_eq!(overall_exit_code(&[r]), EXIT_NOT_RUN);
    }
}
