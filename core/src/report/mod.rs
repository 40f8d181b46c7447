//! Result report extractor: structured fields from agent output, and the final report.

mod extract;
mod render;

pub use extract::{
    extract_coverage, extract_files_changed, extract_key_output, extract_test_results,
    parse_coverage_num,
};
pub use render::{render_report, ReportMode, TaskStatus};

use crate::executor::types::ExecutionResult;

/// Default length bound of `ExecutionResult::key_output`.
pub const KEY_OUTPUT_CHARS: usize = 150;

/// Fill the derived report fields of `result` from its message.
pub fn enrich(result: &mut ExecutionResult, coverage_target: f64) {
    enrich_with(result, coverage_target, KEY_OUTPUT_CHARS);
}

pub fn enrich_with(result: &mut ExecutionResult, coverage_target: f64, key_output_chars: usize) {
    result.coverage_target = coverage_target;
    if result.message.trim().is_empty() {
        return;
    }

    let lines: Vec<&str> = result.message.lines().collect();
    result.coverage = extract_coverage(&lines);
    result.coverage_num = parse_coverage_num(&result.coverage);
    result.files_changed = extract_files_changed(&lines);
    let (passed, failed) = extract_test_results(&lines);
    result.tests_passed = passed;
    result.tests_failed = failed;
    result.key_output = extract_key_output(&lines, key_output_chars);
}
