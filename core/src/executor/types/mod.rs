mod result;
mod task;

pub use result::*;
pub use task::*;
