use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::runner::{NullSink, OutputSink};

/// Run-wide state built once by the binary and shared by reference.
#[derive(Clone)]
pub struct AppContext {
    cfg: Arc<AppConfig>,
    sink: Arc<dyn OutputSink>,
    cancel: CancellationToken,
}

impl AppContext {
    pub fn new(cfg: AppConfig, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            cfg: Arc::new(cfg),
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Context with a discarding sink, for callers that only need config and cancellation.
    pub fn with_config(cfg: AppConfig) -> Self {
        Self::new(cfg, Arc::new(NullSink))
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn sink(&self) -> Arc<dyn OutputSink> {
        self.sink.clone()
    }

    /// Cancelling this token terminates every in-flight task and stops the layer loop.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
