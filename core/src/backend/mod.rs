//! Backend registry and per-backend argument dialects.
//!
//! Each supported coding-agent CLI takes the task text (or the stdin sentinel)
//! in a different position and spells resume, streaming JSON and permission
//! flags differently. `Backend::build_args` is the only place that knows this.

use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::executor::types::{Task, TaskMode};

/// Passed in place of the task text when the text is streamed on stdin.
pub const STDIN_SENTINEL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Codex,
    Claude,
    Gemini,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Codex, Backend::Claude, Backend::Gemini];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Codex => "codex",
            Backend::Claude => "claude",
            Backend::Gemini => "gemini",
        }
    }

    /// Executable looked up on `PATH`.
    pub fn command(&self) -> &'static str {
        self.name()
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let key = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.name() == key)
            .ok_or_else(|| ConfigError::UnknownBackend {
                name: name.to_string(),
                supported: Self::ALL
                    .iter()
                    .map(|b| b.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Build the argument vector. `target` is the task text or [`STDIN_SENTINEL`].
    pub fn build_args(&self, args: &BackendArgs, target: &str) -> Vec<String> {
        match self {
            Backend::Codex => codex_args(args, target),
            Backend::Claude => claude_args(args, target),
            Backend::Gemini => gemini_args(args, target),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackendArgs {
    pub mode: TaskMode,
    pub session_id: Option<String>,
    pub workdir: PathBuf,
    pub skip_permissions: bool,
}

impl BackendArgs {
    pub fn from_task(task: &Task, skip_permissions: bool) -> Self {
        Self {
            mode: task.mode,
            session_id: task.session_id.clone(),
            workdir: task.workdir.clone(),
            skip_permissions,
        }
    }

    fn resume_id(&self) -> Option<&str> {
        if self.mode != TaskMode::Resume {
            return None;
        }
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn codex_args(args: &BackendArgs, target: &str) -> Vec<String> {
    let mut out = vec!["e".to_string(), "--skip-git-repo-check".to_string()];

    if let Some(sid) = args.resume_id() {
        // Resumed sessions keep the working directory they were started in.
        out.extend(["--json".into(), "resume".into(), sid.to_string()]);
    } else {
        out.push("-C".to_string());
        out.push(args.workdir.display().to_string());
        out.push("--json".to_string());
    }

    out.push(target.to_string());
    out
}

fn claude_args(args: &BackendArgs, target: &str) -> Vec<String> {
    let mut out = vec!["-p".to_string()];
    if args.skip_permissions {
        out.push("--dangerously-skip-permissions".to_string());
    }

    // Empty setting sources stop claude from loading project settings that
    // could route back into this wrapper.
    out.push("--setting-sources".to_string());
    out.push(String::new());

    if let Some(sid) = args.resume_id() {
        out.push("-r".to_string());
        out.push(sid.to_string());
    }

    out.extend([
        "--output-format".into(),
        "stream-json".into(),
        "--verbose".into(),
        target.to_string(),
    ]);
    out
}

fn gemini_args(args: &BackendArgs, target: &str) -> Vec<String> {
    let mut out = vec![
        "--output-format".to_string(),
        "stream-json".to_string(),
        "-y".to_string(),
    ];

    if let Some(sid) = args.resume_id() {
        out.push("-r".to_string());
        out.push(sid.to_string());
    }

    out.push("-p".to_string());
    out.push(target.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn new_args(workdir: &str) -> BackendArgs {
        BackendArgs {
            workdir: PathBuf::from(workdir),
            ..Default::default()
        }
    }

    fn resume_args(sid: &str) -> BackendArgs {
        BackendArgs {
            mode: TaskMode::Resume,
            session_id: Some(sid.to_string()),
            workdir: PathBuf::from("."),
            skip_permissions: false,
        }
    }

    #[test]
    fn codex_new_session() {
        let args = Backend::Codex.build_args(&new_args("/repo"), "fix the build");
        assert_eq!(
            args,
            vec!["e", "--skip-git-repo-check", "-C", "/repo", "--json", "fix the build"]
        );
    }

    #[test]
    fn codex_resume_drops_workdir() {
        let args = Backend::Codex.build_args(&resume_args("sid-1"), STDIN_SENTINEL);
        assert_eq!(
            args,
            vec!["e", "--skip-git-repo-check", "--json", "resume", "sid-1", "-"]
        );
    }

    #[test]
    fn claude_new_and_resume() {
        let mut a = new_args(".");
        a.skip_permissions = true;
        assert_eq!(
            Backend::Claude.build_args(&a, "hi"),
            vec![
                "-p",
                "--dangerously-skip-permissions",
                "--setting-sources",
                "",
                "--output-format",
                "stream-json",
                "--verbose",
                "hi"
            ]
        );

        assert_eq!(
            Backend::Claude.build_args(&resume_args("abc"), "-"),
            vec![
                "-p",
                "--setting-sources",
                "",
                "-r",
                "abc",
                "--output-format",
                "stream-json",
                "--verbose",
                "-"
            ]
        );
    }

    #[test]
    fn gemini_task_follows_p_flag() {
        assert_eq!(
            Backend::Gemini.build_args(&new_args("."), "hi"),
            vec!["--output-format", "stream-json", "-y", "-p", "hi"]
        );
        assert_eq!(
            Backend::Gemini.build_args(&resume_args("g1"), "hi"),
            vec!["--output-format", "stream-json", "-y", "-r", "g1", "-p", "hi"]
        );
    }

    #[test]
    fn resume_without_session_id_builds_new_session() {
        let args = BackendArgs {
            mode: TaskMode::Resume,
            session_id: Some("  ".into()),
            workdir: PathBuf::from("w"),
            skip_permissions: false,
        };
        assert!(!Backend::Gemini.build_args(&args, "x").contains(&"-r".to_string()));
    }

    #[test]
    fn from_name_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(Backend::from_name("Claude").unwrap(), Backend::Claude);
        let err = Backend::from_name("cursor").unwrap_err();
        match err {
            ConfigError::UnknownBackend { name, supported } => {
                assert_eq!(name, "cursor");
                assert_eq!(supported, "codex, claude, gemini");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
