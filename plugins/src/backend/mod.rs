pub mod codecli;
pub mod encoding;

pub use codecli::{CodeCliPlanner, InputSource};
pub use encoding::{should_use_stdin, stdin_reasons, StdinReason};
