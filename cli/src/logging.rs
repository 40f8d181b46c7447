use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use codeagent_core::api::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Lines shown under `=== Recent Errors ===` on failure.
pub const RECENT_ERROR_LINES: usize = 10;

/// The per-process log file and the writer guard that flushes it.
#[derive(Default)]
pub struct LogSession {
    path: Option<PathBuf>,
    guard: Option<WorkerGuard>,
}

impl LogSession {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flushes the log, prints its recent warnings and errors when the run
    /// failed, then deletes it.
    pub fn finish(mut self, exit_code: i32) {
        drop(self.guard.take());
        let Some(path) = self.path.take() else {
            return;
        };

        if exit_code != 0 {
            let recent = recent_errors(&path, RECENT_ERROR_LINES);
            if !recent.is_empty() {
                eprintln!("\n=== Recent Errors ===");
                for line in &recent {
                    eprintln!("{line}");
                }
                eprintln!("Log file: {} (deleted)", path.display());
            }
        }
        let _ = std::fs::remove_file(&path);
    }
}

pub fn log_file_name(pid: u32) -> String {
    format!("codeagent.{pid}.log")
}

pub fn log_dir(logging: &LoggingConfig) -> PathBuf {
    match logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(d) => PathBuf::from(d),
        None => std::env::temp_dir().join("codeagent"),
    }
}

/// Where the log goes when the configured directory cannot be created.
pub fn fallback_log_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Every directory a `codeagent.<pid>.log` may have been written to.
pub fn sweep_dirs(logging: &LoggingConfig) -> Vec<PathBuf> {
    let mut dirs = vec![log_dir(logging)];
    let fallback = fallback_log_dir();
    if !dirs.contains(&fallback) {
        dirs.push(fallback);
    }
    dirs
}

pub fn init_tracing(logging: &LoggingConfig) -> Result<LogSession, String> {
    if !logging.enabled {
        return Ok(LogSession::default());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut session = LogSession::default();
    let mut maybe_writer = None;

    if logging.file {
        let mut dir = log_dir(logging);
        if std::fs::create_dir_all(&dir).is_err() {
            dir = fallback_log_dir();
        }
        let file_name = log_file_name(std::process::id());
        session.path = Some(dir.join(&file_name));
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        session.guard = Some(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())?;

    Ok(session)
}

/// Last `limit` WARN/ERROR lines of the log file, oldest first.
pub fn recent_errors(path: &Path, limit: usize) -> Vec<String> {
    let Ok(file) = std::fs::File::open(path) else {
        return Vec::new();
    };
    let mut hits: Vec<String> = BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|line| is_warn_or_error(line))
        .collect();
    if hits.len() > limit {
        hits.drain(..hits.len() - limit);
    }
    hits
}

fn is_warn_or_error(line: &str) -> bool {
    line.split_whitespace()
        .take(2)
        .any(|tok| tok == "WARN" || tok == "ERROR")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn recent_errors_keeps_the_tail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codeagent.1.log");
        let mut body = String::new();
        for i in 0..15 {
            body.push_str(&format!("2026-01-01T00:00:00Z  INFO codeagent: info {i}\n"));
            body.push_str(&format!("2026-01-01T00:00:00Z ERROR codeagent: boom {i}\n"));
        }
        body.push_str("2026-01-01T00:00:00Z  WARN codeagent: last warning\n");
        std::fs::write(&path, body).unwrap();

        let recent = recent_errors(&path, RECENT_ERROR_LINES);

        assert_eq!(recent.len(), 10);
        assert!(recent[0].ends_with("boom 6"));
        assert!(recent[9].ends_with("last warning"));
    }

    #[test]
    fn message_text_does_not_count_as_level() {
        assert!(!is_warn_or_error(
            "2026-01-01T00:00:00Z  INFO codeagent: ERROR appeared in output"
        ));
    }

    #[test]
    fn missing_log_has_no_errors() {
        let dir = TempDir::new().unwrap();
        assert!(recent_errors(&dir.path().join("nope.log"), 10).is_empty());
    }

    #[test]
    fn finish_removes_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(log_file_name(42));
        std::fs::write(&path, "2026-01-01T00:00:00Z ERROR x: y\n").unwrap();
        let session = LogSession {
            path: Some(path.clone()),
            guard: None,
        };

        session.finish(1);

        assert!(!path.exists());
    }

    #[test]
    fn sweep_covers_the_fallback_directory() {
        let cfg = LoggingConfig {
            directory: Some("/var/log/codeagent".into()),
            ..Default::default()
        };
        assert_eq!(
            sweep_dirs(&cfg),
            vec![PathBuf::from("/var/log/codeagent"), fallback_log_dir()]
        );
    }

    #[test]
    fn sweep_lists_a_shared_directory_once() {
        let cfg = LoggingConfig {
            directory: Some(fallback_log_dir().display().to_string()),
            ..Default::default()
        };
        assert_eq!(sweep_dirs(&cfg), vec![fallback_log_dir()]);
    }

    #[test]
    fn log_dir_falls_back_to_temp() {
        let cfg = LoggingConfig {
            directory: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(log_dir(&cfg), std::env::temp_dir().join("codeagent"));
    }
}
