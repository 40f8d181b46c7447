use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::backend::Backend;
use crate::error::InputError;
use crate::executor::types::{Task, TaskMode};

use super::id_gen::generate_task_id;

const TASK_MARKER: &str = "---TASK---";
const CONTENT_MARKER: &str = "---CONTENT---";
const END_MARKER: &str = "---END---";

static ID_REGEX: OnceLock<Regex> = OnceLock::new();

/// Parse a task document into tasks, in document order.
///
/// Metadata keys are case-insensitive. `backend` falls back to
/// `default_backend`, a missing `id` is generated, and a `session_id` puts the
/// task in resume mode. Dependency references are checked later by the graph.
pub fn parse_task_document(input: &str, default_backend: Backend) -> Result<Vec<Task>, InputError> {
    let mut lines = input.lines();
    let mut tasks: Vec<Task> = Vec::new();
    let mut ids: HashSet<String> = HashSet::new();

    while let Some(line) = lines.next() {
        if line.trim() != TASK_MARKER {
            continue;
        }

        let mut metadata: HashMap<String, String> = HashMap::new();
        let mut saw_content_marker = false;

        for line in lines.by_ref() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == CONTENT_MARKER {
                saw_content_marker = true;
                break;
            }
            let Some((k, v)) = trimmed.split_once(':') else {
                return Err(InputError::InvalidMetadataLine(trimmed.to_string()));
            };
            metadata.insert(normalize_key(k), v.trim().to_string());
        }

        if !saw_content_marker {
            return Err(InputError::MissingContentMarker);
        }

        let mut content_lines: Vec<&str> = Vec::new();
        let mut ended = false;
        for line in lines.by_ref() {
            if line.trim() == END_MARKER {
                ended = true;
                break;
            }
            content_lines.push(line);
        }

        if !ended {
            return Err(InputError::MissingEndMarker);
        }

        let task = build_task(metadata, content_lines.join("\n"), default_backend)?;
        if !ids.insert(task.id.clone()) {
            return Err(InputError::DuplicateId(task.id));
        }
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(InputError::NoTasks);
    }

    Ok(tasks)
}

fn build_task(
    mut metadata: HashMap<String, String>,
    body: String,
    default_backend: Backend,
) -> Result<Task, InputError> {
    let id = match metadata.remove("id") {
        Some(id) if id.is_empty() => return Err(InputError::InvalidId(id)),
        Some(id) => id,
        None => generate_task_id(),
    };
    validate_id(&id)?;

    let backend = match metadata.remove("backend").filter(|b| !b.is_empty()) {
        Some(name) => Backend::from_name(&name).map_err(|source| InputError::Backend {
            task: id.clone(),
            source,
        })?,
        None => default_backend,
    };

    let workdir = metadata
        .remove("workdir")
        .filter(|w| !w.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let session_id = metadata.remove("session_id").filter(|s| !s.is_empty());
    let mode = match metadata.remove("mode").as_deref().map(str::to_ascii_lowercase) {
        None => {
            if session_id.is_some() {
                TaskMode::Resume
            } else {
                TaskMode::New
            }
        }
        Some(m) if m == "resume" => TaskMode::Resume,
        Some(m) if m == "new" => TaskMode::New,
        Some(m) => {
            return Err(InputError::InvalidValue {
                task: id,
                field: "mode",
                value: m,
            })
        }
    };
    if mode == TaskMode::Resume && session_id.is_none() {
        return Err(InputError::MissingField {
            task: id,
            field: "session_id",
        });
    }

    let dependencies = metadata
        .remove("dependencies")
        .map(|s| split_csv(&s))
        .unwrap_or_default();

    let timeout = match metadata.remove("timeout") {
        None => None,
        Some(raw) => match raw.parse::<u64>() {
            Ok(v) if v > 0 => Some(v),
            _ => {
                return Err(InputError::InvalidValue {
                    task: id,
                    field: "timeout",
                    value: raw,
                })
            }
        },
    };

    for key in metadata.keys() {
        tracing::debug!(task_id = %id, key = %key, "ignoring unknown task metadata");
    }

    Ok(Task {
        id,
        backend,
        body,
        workdir,
        mode,
        session_id,
        dependencies,
        timeout,
    })
}

fn normalize_key(k: &str) -> String {
    k.trim().to_ascii_lowercase().replace('-', "_")
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_id(id: &str) -> Result<(), InputError> {
    let re = ID_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-\.]{0,127}$").expect("ID_REGEX is valid")
    });
    if !re.is_match(id) {
        return Err(InputError::InvalidId(id.to_string()));
    }
    Ok(())
}
