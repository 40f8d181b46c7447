//! codeagent CLI library: modules exposed for the binary and its tests.

pub mod app;
pub mod commands;
pub mod logging;
