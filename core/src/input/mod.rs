//! Parallel-mode task document.
//!
//! ```text
//! ---TASK---
//! id: build
//! backend: claude
//! dependencies: lint, fmt
//! ---CONTENT---
//! free text body
//! ---END---
//! ```

mod id_gen;
mod parser;

pub use id_gen::generate_task_id;
pub use parser::parse_task_document;
