use std::path::PathBuf;

use crate::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskMode {
    #[default]
    New,
    Resume,
}

/// One unit of work handed to a backend CLI.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub backend: Backend,
    pub body: String,
    pub workdir: PathBuf,
    pub mode: TaskMode,
    pub session_id: Option<String>,
    pub dependencies: Vec<String>,
    /// Per-task deadline in seconds.
    pub timeout: Option<u64>,
}

impl Task {
    pub fn new(id: impl Into<String>, backend: Backend, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            backend,
            body: body.into(),
            workdir: PathBuf::from("."),
            mode: TaskMode::New,
            session_id: None,
            dependencies: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    pub fn resume(mut self, session_id: impl Into<String>) -> Self {
        self.mode = TaskMode::Resume;
        self.session_id = Some(session_id.into());
        self
    }
}

/// Common task interface for executor graph handling.
pub trait TaskLike: Clone + Send + Sync {
    fn id(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

impl TaskLike for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}
