use thiserror::Error;

use crate::executor::types::{EXIT_GENERAL_ERROR, EXIT_NOT_FOUND};

use super::executor::ExecutorError;
use super::input::InputError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid task input: {0}")]
    Input(#[from] InputError),
    #[error("{0}")]
    Executor(#[from] ExecutorError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration problems. All of them are detected before any subprocess starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unsupported backend '{name}' (supported: {supported})")]
    UnknownBackend { name: String, supported: String },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to spawn '{cmd}': {source}")]
    Spawn {
        cmd: String,
        source: std::io::Error,
    },
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("failed to wait for child: {0}")]
    Wait(std::io::Error),
    #[error("child {0} was not piped")]
    NotPiped(&'static str),
}

impl RunnerError {
    /// Exit code reported for a task whose subprocess failed at this stage.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                EXIT_NOT_FOUND
            }
            _ => EXIT_GENERAL_ERROR,
        }
    }
}

/// Failure to turn a task into a launchable command.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("backend command '{command}' not found in PATH")]
    CommandNotFound { command: String },
    #[error("{0}")]
    Invalid(String),
}

impl PlanError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandNotFound { .. } => EXIT_NOT_FOUND,
            _ => EXIT_GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_not_found_maps_to_127() {
        let err = RunnerError::Spawn {
            cmd: "codex".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), EXIT_NOT_FOUND);

        let err = RunnerError::Wait(std::io::Error::other("gone"));
        assert_eq!(err.exit_code(), EXIT_GENERAL_ERROR);
    }

    #[test]
    fn cli_error_wraps_setup_failures() {
        let err: CliError = ConfigError::Invalid("bad timeout".into()).into();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.to_string(), "config error: bad timeout");

        let err: CliError = std::io::Error::other("stdin closed").into();
        assert_eq!(err.to_string(), "io error: stdin closed");
    }
}
