use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend used when neither the command line nor a task names one.
    #[serde(default = "default_backend_name")]
    pub default: String,

    /// Pass the permission-bypass flag to backends that support it.
    #[serde(default)]
    pub skip_permissions: bool,
}

fn default_backend_name() -> String {
    "codex".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default: default_backend_name(),
            skip_permissions: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr as well as to the log file.
    #[serde(default)]
    pub console: bool,

    /// If true, log to `codeagent.<pid>.log` under `directory`.
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "codeagent_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses ~/.codeagent/logs.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: false,
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// What happens to a task whose dependency finished with a nonzero exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyPolicy {
    /// Dependencies only gate ordering; the task still runs.
    #[default]
    Run,
    /// The task is reported as not-run.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Global budget for the whole run, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default per-task deadline; tasks may override it. Unset means the global budget.
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,

    /// Grace window between SIGTERM and the forced kill.
    #[serde(default = "default_force_kill_delay_secs")]
    pub force_kill_delay_secs: u64,

    #[serde(default = "default_stdout_capture_bytes")]
    pub stdout_capture_bytes: usize,

    #[serde(default = "default_stderr_capture_bytes")]
    pub stderr_capture_bytes: usize,

    #[serde(default = "default_line_channel_capacity")]
    pub line_channel_capacity: usize,

    #[serde(default)]
    pub on_dependency_failure: DependencyPolicy,

    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,
}

fn default_timeout_secs() -> u64 {
    7200
}

fn default_force_kill_delay_secs() -> u64 {
    5
}

fn default_stdout_capture_bytes() -> usize {
    1024 * 1024
}

fn default_stderr_capture_bytes() -> usize {
    4 * 1024
}

fn default_line_channel_capacity() -> usize {
    1024
}

fn default_progress_bar() -> bool {
    true
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            task_timeout_secs: None,
            force_kill_delay_secs: default_force_kill_delay_secs(),
            stdout_capture_bytes: default_stdout_capture_bytes(),
            stderr_capture_bytes: default_stderr_capture_bytes(),
            line_channel_capacity: default_line_channel_capacity(),
            on_dependency_failure: DependencyPolicy::default(),
            progress_bar: default_progress_bar(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_coverage_target")]
    pub coverage_target: f64,

    #[serde(default = "default_key_output_chars")]
    pub key_output_chars: usize,

    /// Use PASS/WARN/FAIL instead of symbols.
    #[serde(default)]
    pub ascii: bool,
}

fn default_coverage_target() -> f64 {
    90.0
}

fn default_key_output_chars() -> usize {
    150
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            coverage_target: default_coverage_target(),
            key_output_chars: default_key_output_chars(),
            ascii: false,
        }
    }
}
