use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use codeagent_core::api as core_api;
use core_api::{Backend, BackendArgs, LaunchSpec, PlanError, Task, STDIN_SENTINEL};

use crate::backend::encoding::stdin_reasons;

/// Largest `~/.claude/settings.json` we are willing to read.
const MAX_SETTINGS_BYTES: u64 = 1024 * 1024;

/// Where the task text came from, as far as stdin routing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Given directly on the command line or read from a task document.
    #[default]
    Inline,
    /// Read from our stdin because stdin was not a terminal.
    Piped,
    /// Read from our stdin because the user passed `-`.
    ExplicitStdin,
}

/// Plans launches of the codex/claude/gemini command-line agents.
#[derive(Debug, Clone, Default)]
pub struct CodeCliPlanner {
    input: InputSource,
    skip_permissions: bool,
    search_path: Option<OsString>,
    claude_settings: Option<PathBuf>,
}

impl CodeCliPlanner {
    pub fn new(input: InputSource, skip_permissions: bool) -> Self {
        Self {
            input,
            skip_permissions,
            search_path: None,
            claude_settings: default_claude_settings(),
        }
    }

    /// Resolve backend commands against `path` instead of `$PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Read the claude environment from `path` (`None` disables it).
    pub fn with_claude_settings(mut self, path: Option<PathBuf>) -> Self {
        self.claude_settings = path;
        self
    }

    fn resolve_command(&self, backend: Backend) -> Result<PathBuf, PlanError> {
        let command = backend.command();
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(command, Some(paths), cwd)
            }
            None => which::which(command),
        };
        found.map_err(|e| {
            tracing::debug!(command, error = %e, "backend lookup failed");
            PlanError::CommandNotFound {
                command: command.to_string(),
            }
        })
    }

    fn backend_envs(&self, backend: Backend) -> HashMap<String, String> {
        if backend != Backend::Claude {
            return HashMap::new();
        }
        let Some(path) = &self.claude_settings else {
            return HashMap::new();
        };
        if !path.exists() {
            return HashMap::new();
        }
        match load_settings_env(path) {
            Ok(envs) => envs,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring claude settings");
                HashMap::new()
            }
        }
    }
}

impl core_api::TaskPlanner for CodeCliPlanner {
    fn plan(&self, task: &Task) -> Result<LaunchSpec, PlanError> {
        let command = self.resolve_command(task.backend)?;

        let reasons = stdin_reasons(
            &task.body,
            self.input == InputSource::Piped,
            self.input == InputSource::ExplicitStdin,
        );
        for reason in &reasons {
            tracing::warn!(task_id = %task.id, reason = %reason, "passing task text via stdin");
        }
        let use_stdin = !reasons.is_empty();
        let target = if use_stdin {
            STDIN_SENTINEL
        } else {
            task.body.as_str()
        };

        // The child runs inside the workdir, so any path handed to the backend
        // as a flag must not be relative to it.
        let workdir = absolute_workdir(&task.workdir);
        let mut backend_args = BackendArgs::from_task(task, self.skip_permissions);
        backend_args.workdir = workdir.clone();
        let args = task.backend.build_args(&backend_args, target);

        tracing::info!(
            task_id = %task.id,
            backend = %task.backend,
            command = %command.display(),
            use_stdin,
            body_chars = task.body.chars().count(),
            "planned backend launch"
        );

        let mut spec = LaunchSpec::new(command.to_string_lossy());
        spec.args = args;
        spec.cwd = Some(workdir);
        spec.envs = self.backend_envs(task.backend);
        spec.stdin_payload = use_stdin.then(|| task.body.clone());
        Ok(spec)
    }
}

fn absolute_workdir(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => {
            let joined = cwd.join(dir);
            std::fs::canonicalize(&joined).unwrap_or(joined)
        }
        Err(e) => {
            tracing::warn!(workdir = %dir.display(), error = %e, "cannot resolve relative workdir");
            dir.to_path_buf()
        }
    }
}

fn default_claude_settings() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claude").join("settings.json"))
}

/// Reads the string values of the top-level `env` object.
fn load_settings_env(path: &Path) -> Result<HashMap<String, String>> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    if meta.len() > MAX_SETTINGS_BYTES {
        anyhow::bail!(
            "{} is {} bytes, limit is {}",
            path.display(),
            meta.len(),
            MAX_SETTINGS_BYTES
        );
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let mut envs = HashMap::new();
    if let Some(obj) = value.get("env").and_then(|v| v.as_object()) {
        for (k, v) in obj {
            if let Some(s) = v.as_str() {
                envs.insert(k.clone(), s.to_string());
            }
        }
    }
    Ok(envs)
}
