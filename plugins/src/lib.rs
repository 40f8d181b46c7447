//! Concrete pieces plugged into `codeagent-core`: the backend CLI planner,
//! role-file injection and output sinks.

pub mod backend;
pub mod factory;
pub mod processors;
pub mod sink;
