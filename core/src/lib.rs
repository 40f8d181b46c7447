//! Core of `codeagent`: resolves a task dependency graph into layers, runs each
//! layer's tasks as supervised backend subprocesses, and reduces their output
//! into a structured report.

pub mod api;
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod input;
pub mod report;
pub mod runner;
pub mod util;
