use thiserror::Error;

use super::error::ConfigError;

/// Errors raised while reading a parallel task document.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("no task blocks found (expected ---TASK--- ... ---CONTENT--- ... ---END---)")]
    NoTasks,

    #[error("task '{task}' is missing required field '{field}'")]
    MissingField { task: String, field: &'static str },

    #[error("metadata line is invalid: {0}")]
    InvalidMetadataLine(String),

    #[error("missing ---CONTENT--- marker")]
    MissingContentMarker,

    #[error("missing ---END--- marker")]
    MissingEndMarker,

    #[error("invalid task id: {0:?}")]
    InvalidId(String),

    #[error("duplicate task id: {0}")]
    DuplicateId(String),

    #[error("invalid {field} for task '{task}': {value}")]
    InvalidValue {
        task: String,
        field: &'static str,
        value: String,
    },

    #[error("task '{task}': {source}")]
    Backend {
        task: String,
        source: ConfigError,
    },
}
