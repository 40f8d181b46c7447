use std::sync::Arc;

use codeagent_core::api::{AppConfig, NullSink, OutputSink, TaskPlanner};

use crate::backend::{CodeCliPlanner, InputSource};
use crate::processors::RoleFileInjector;
use crate::sink::TracingSink;

pub fn build_planner(cfg: &AppConfig, input: InputSource) -> Box<dyn TaskPlanner> {
    Box::new(CodeCliPlanner::new(input, cfg.backend.skip_permissions))
}

pub fn build_sink(cfg: &AppConfig) -> Arc<dyn OutputSink> {
    if cfg.logging.enabled {
        Arc::new(TracingSink)
    } else {
        Arc::new(NullSink)
    }
}

pub fn build_role_injector() -> RoleFileInjector {
    RoleFileInjector::from_env()
}
