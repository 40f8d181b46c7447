use std::path::PathBuf;

use anyhow::{Context, Result};

const DIRECTIVE: &str = "ROLE_FILE:";

/// Prepends the contents of a role file to task bodies.
///
/// The file comes from a `ROLE_FILE: <path>` first line in the body, or else
/// from the `ROLE_FILE` environment variable. The directive line itself is
/// removed from the body.
#[derive(Debug, Clone, Default)]
pub struct RoleFileInjector {
    env_path: Option<PathBuf>,
}

impl RoleFileInjector {
    pub fn new(env_path: Option<PathBuf>) -> Self {
        Self { env_path }
    }

    /// Reads `ROLE_FILE` from the process environment. Blank values are ignored.
    pub fn from_env() -> Self {
        let env_path = std::env::var("ROLE_FILE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(env_path)
    }

    pub fn inject(&self, body: &str) -> Result<String> {
        let (directive, rest) = split_directive(body);
        let Some(path) = directive.or_else(|| self.env_path.clone()) else {
            return Ok(body.to_string());
        };

        let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
        let role = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read role file {}", path.display()))?;

        let role = role.trim_end();
        if role.is_empty() {
            return Ok(rest.to_string());
        }
        Ok(format!("{}\n\n{}", role, rest))
    }

    /// Same as [`inject`](Self::inject), but a failure is logged and the body kept as is.
    pub fn apply(&self, task_id: &str, body: &str) -> String {
        match self.inject(body) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(task_id, error = %format!("{:#}", e), "role file not injected");
                body.to_string()
            }
        }
    }
}

fn split_directive(body: &str) -> (Option<PathBuf>, &str) {
    let (first, rest) = match body.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (body, ""),
    };
    match first.trim().strip_prefix(DIRECTIVE) {
        Some(path) if !path.trim().is_empty() => (Some(PathBuf::from(path.trim())), rest),
        _ => (None, body),
    }
}
