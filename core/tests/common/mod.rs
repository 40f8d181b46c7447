#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use codeagent_core::api::{
    AppConfig, AppContext, Backend, LaunchSpec, PlanError, Task, TaskPlanner,
};

/// Plans each task as a `/bin/sh -c <script>` launch keyed by task id.
/// Tasks without a script fail planning as command-not-found.
#[derive(Default)]
pub struct ScriptPlanner {
    scripts: HashMap<String, String>,
    calls: AtomicUsize,
}

impl ScriptPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, task_id: &str, script: impl Into<String>) -> Self {
        self.scripts.insert(task_id.to_string(), script.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TaskPlanner for ScriptPlanner {
    fn plan(&self, task: &Task) -> Result<LaunchSpec, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(&task.id)
            .ok_or_else(|| PlanError::CommandNotFound {
                command: format!("script for {}", task.id),
            })?;
        Ok(LaunchSpec {
            cmd: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), script.clone()],
            cwd: Some(task.workdir.clone()),
            ..Default::default()
        })
    }
}

pub fn task(id: &str, deps: &[&str]) -> Task {
    Task::new(id, Backend::Codex, format!("do {id}")).with_dependencies(deps.iter().copied())
}

/// Context with the progress display off and a short kill grace.
pub fn context(configure: impl FnOnce(&mut AppConfig)) -> AppContext {
    init_tracing();
    let mut cfg = AppConfig::default();
    cfg.executor.progress_bar = false;
    cfg.executor.force_kill_delay_secs = 1;
    configure(&mut cfg);
    AppContext::with_config(cfg)
}

pub fn marker(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("codeagent_core=debug")
        .try_init();
}
