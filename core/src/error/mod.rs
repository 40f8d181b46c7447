#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod input;

pub use error::{CliError, ConfigError, PlanError, RunnerError};
pub use executor::ExecutorError;
pub use input::InputError;
