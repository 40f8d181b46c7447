use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

// Cached regexes (compiled once, reused forever)
static COVERAGE_REGEX: OnceLock<Regex> = OnceLock::new();
static TOTAL_ROW_REGEX: OnceLock<Regex> = OnceLock::new();
static FILE_LINE_REGEX: OnceLock<Regex> = OnceLock::new();
static FILES_HEADER_REGEX: OnceLock<Regex> = OnceLock::new();
static BULLET_REGEX: OnceLock<Regex> = OnceLock::new();
static PASSED_REGEX: OnceLock<Regex> = OnceLock::new();
static FAILED_REGEX: OnceLock<Regex> = OnceLock::new();

fn coverage_regex() -> &'static Regex {
    COVERAGE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)coverage[^0-9\n]{0,24}?(\d{1,3}(?:\.\d+)?)\s*%")
            .expect("COVERAGE_REGEX is valid")
    })
}

fn total_row_regex() -> &'static Regex {
    // pytest-cov / go tool cover style summary rows: "TOTAL   120   8   93%"
    TOTAL_ROW_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?i:total)\b.*?(\d{1,3}(?:\.\d+)?)%\s*$").expect("TOTAL_ROW_REGEX is valid")
    })
}

fn file_line_regex() -> &'static Regex {
    FILE_LINE_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:[-*]\s+)?(?:modified|created|updated|added|changed|deleted|new file)\s*:\s*`?([^\s`]+)`?",
        )
        .expect("FILE_LINE_REGEX is valid")
    })
}

fn files_header_regex() -> &'static Regex {
    FILES_HEADER_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:#+\s*)?(?:files?\s+(?:changed|modified)|changed\s+files)\s*:?\s*$")
            .expect("FILES_HEADER_REGEX is valid")
    })
}

fn bullet_regex() -> &'static Regex {
    BULLET_REGEX.get_or_init(|| {
        Regex::new(r"^\s*[-*]\s+`?([^\s`]+)`?").expect("BULLET_REGEX is valid")
    })
}

fn passed_regex() -> &'static Regex {
    PASSED_REGEX
        .get_or_init(|| Regex::new(r"(?i)(\d+)\s+(?:tests?\s+)?passed").expect("PASSED_REGEX is valid"))
}

fn failed_regex() -> &'static Regex {
    FAILED_REGEX
        .get_or_init(|| Regex::new(r"(?i)(\d+)\s+(?:tests?\s+)?failed").expect("FAILED_REGEX is valid"))
}

/// First coverage percentage mentioned, as written (e.g. `"87.3%"`). Empty if none.
pub fn extract_coverage(lines: &[&str]) -> String {
    for line in lines {
        if let Some(cap) = coverage_regex().captures(line) {
            return format!("{}%", &cap[1]);
        }
    }
    for line in lines {
        if let Some(cap) = total_row_regex().captures(line) {
            return format!("{}%", &cap[1]);
        }
    }
    String::new()
}

/// `"87.3%"` -> `Some(87.3)`. Anything unparsable is `None`.
pub fn parse_coverage_num(coverage: &str) -> Option<f64> {
    let n = coverage.trim().trim_end_matches('%').trim();
    if n.is_empty() {
        return None;
    }
    n.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Paths named on `Modified: path`-style lines or listed under a
/// "Files changed" heading. Order of first mention, no duplicates.
pub fn extract_files_changed(lines: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    let mut in_section = false;

    let mut add = |path: &str, files: &mut Vec<String>| {
        let path = path.trim_end_matches([',', '.', ';', ':']);
        if !path.is_empty() && seen.insert(path.to_string()) {
            files.push(path.to_string());
        }
    };

    for line in lines {
        if files_header_regex().is_match(line) {
            in_section = true;
            continue;
        }
        if let Some(cap) = file_line_regex().captures(line) {
            add(&cap[1], &mut files);
            continue;
        }
        if in_section {
            match bullet_regex().captures(line) {
                Some(cap) => add(&cap[1], &mut files),
                None if line.trim().is_empty() => {}
                None => in_section = false,
            }
        }
    }

    files
}

/// `(passed, failed)` from the last line that reports either count.
pub fn extract_test_results(lines: &[&str]) -> (u32, u32) {
    for line in lines.iter().rev() {
        let passed = passed_regex()
            .captures(line)
            .and_then(|c| c[1].parse::<u32>().ok());
        let failed = failed_regex()
            .captures(line)
            .and_then(|c| c[1].parse::<u32>().ok());
        if passed.is_some() || failed.is_some() {
            return (passed.unwrap_or(0), failed.unwrap_or(0));
        }
    }
    (0, 0)
}

/// One-line summary: an explicit `Summary:` line if present, else the first
/// line with real content. At most `max_chars` characters.
pub fn extract_key_output(lines: &[&str], max_chars: usize) -> String {
    let summary = lines.iter().find_map(|line| {
        let t = line.trim().trim_start_matches(['#', '*', ' ']);
        let lower = t.to_ascii_lowercase();
        lower
            .starts_with("summary:")
            .then(|| t["summary:".len()..].trim())
            .filter(|s| !s.is_empty())
    });

    let picked = summary.or_else(|| {
        lines
            .iter()
            .map(|l| l.trim())
            .find(|l| is_meaningful(l))
            .map(|l| l.trim_start_matches(['#', ' ']))
    });

    picked.map(|s| truncate_chars(s, max_chars)).unwrap_or_default()
}

fn is_meaningful(line: &str) -> bool {
    if line.is_empty() || line.starts_with("```") {
        return false;
    }
    line.chars().any(|c| c.is_alphanumeric())
}

pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return s.chars().take(max_chars).collect();
    }
    let mut out: String = s.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn coverage_line_is_extracted() {
        let lines = ["Ran tests", "Coverage: 87.3%", "done"];
        assert_eq!(extract_coverage(&lines), "87.3%");
        assert_eq!(parse_coverage_num("87.3%"), Some(87.3));
    }

    #[test]
    fn coverage_from_total_row() {
        let lines = ["Name    Stmts   Miss  Cover", "TOTAL     120      8    93%"];
        assert_eq!(extract_coverage(&lines), "93%");
    }

    #[test]
    fn coverage_absent_is_none() {
        assert_eq!(extract_coverage(&["nothing here"]), "");
        assert_eq!(parse_coverage_num(""), None);
        assert_eq!(parse_coverage_num("n/a"), None);
    }

    #[test]
    fn test_counts_are_extracted() {
        assert_eq!(extract_test_results(&["Tests: 12 passed, 1 failed"]), (12, 1));
        assert_eq!(
            extract_test_results(&["test result: ok. 40 passed; 0 failed; 0 ignored"]),
            (40, 0)
        );
        assert_eq!(extract_test_results(&["no tests"]), (0, 0));
    }

    #[test]
    fn last_test_summary_wins() {
        let lines = ["3 passed", "build again", "5 passed, 2 failed"];
        assert_eq!(extract_test_results(&lines), (5, 2));
    }

    #[test]
    fn files_from_prefixed_lines_and_section() {
        let lines = [
            "Modified: src/lib.rs",
            "Created: `src/new.rs`",
            "",
            "Files changed:",
            "- src/lib.rs",
            "- docs/README.md",
            "",
            "All good.",
            "- not-a-file-anymore",
        ];
        assert_eq!(
            extract_files_changed(&lines),
            vec!["src/lib.rs", "src/new.rs", "docs/README.md"]
        );
    }

    #[test]
    fn key_output_prefers_summary_line() {
        let lines = ["# Report", "Summary: fixed the flaky test", "details"];
        assert_eq!(extract_key_output(&lines, 150), "fixed the flaky test");
    }

    #[test]
    fn key_output_falls_back_to_first_meaningful_line() {
        let lines = ["", "```", "---", "## Implemented retry logic"];
        assert_eq!(extract_key_output(&lines, 150), "Implemented retry logic");
    }

    #[test]
    fn key_output_is_bounded() {
        let long = "x".repeat(400);
        let out = extract_key_output(&[long.as_str()], 150);
        assert_eq!(out.chars().count(), 150);
        assert!(out.ends_with("..."));
    }
}
