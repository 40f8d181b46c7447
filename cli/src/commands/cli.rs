use std::path::PathBuf;

use clap::{Parser, Subcommand};

const AFTER_HELP: &str = "\
Parallel mode reads a task document from stdin:
    codeagent --parallel < tasks.txt
    codeagent --parallel --full-output <<'EOF'

Environment variables:
    CODEX_TIMEOUT               Run timeout in seconds (values above 10000 are milliseconds)
    CODEAGENT_ASCII_MODE        Report with PASS/WARN/FAIL instead of symbols
    CODEAGENT_FORCE_KILL_DELAY  Seconds between SIGTERM and SIGKILL
    ROLE_FILE                   File prepended to every task body
    RUST_LOG                    Log filter

Exit codes:
    0    Success
    1    General error (bad arguments, no output)
    124  Timeout
    127  Backend command not found
    130  Interrupted (Ctrl+C)
    *    Passthrough from the backend process";

/// Run AI coding-agent CLIs (codex, claude, gemini) as supervised tasks.
#[derive(Parser, Debug)]
#[command(
    name = "codeagent",
    version,
    about,
    after_help = AFTER_HELP,
    args_conflicts_with_subcommands = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend to use: codex, claude or gemini.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Run the task document read from stdin with dependency ordering.
    #[arg(long)]
    pub parallel: bool,

    /// Include full agent output in the parallel report.
    #[arg(long)]
    pub full_output: bool,

    /// Task text, or `-` to read it from stdin.
    pub task: Option<String>,

    /// Working directory for the backend.
    pub workdir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Continue an existing backend session.
    Resume {
        session_id: String,
        /// Task text, or `-` to read it from stdin.
        task: String,
        workdir: Option<PathBuf>,
    },
    /// Delete log files left behind by processes that are no longer running.
    Cleanup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_task_with_workdir() {
        let args = Args::try_parse_from(["codeagent", "--backend", "claude", "fix it", "/src"])
            .unwrap();
        assert_eq!(args.backend.as_deref(), Some("claude"));
        assert_eq!(args.task.as_deref(), Some("fix it"));
        assert_eq!(args.workdir, Some(PathBuf::from("/src")));
        assert!(!args.parallel);
    }

    #[test]
    fn dash_is_a_task_value() {
        let args = Args::try_parse_from(["codeagent", "-"]).unwrap();
        assert_eq!(args.task.as_deref(), Some("-"));
    }

    #[test]
    fn parses_resume() {
        let args =
            Args::try_parse_from(["codeagent", "resume", "sess-1", "keep going", "/w"]).unwrap();
        match args.command {
            Some(Commands::Resume {
                session_id,
                task,
                workdir,
            }) => {
                assert_eq!(session_id, "sess-1");
                assert_eq!(task, "keep going");
                assert_eq!(workdir, Some(PathBuf::from("/w")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parallel_flags() {
        let args =
            Args::try_parse_from(["codeagent", "--parallel", "--full-output", "--backend=gemini"])
                .unwrap();
        assert!(args.parallel);
        assert!(args.full_output);
        assert_eq!(args.backend.as_deref(), Some("gemini"));
        assert!(args.task.is_none());
    }
}
