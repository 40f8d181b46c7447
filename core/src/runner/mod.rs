//! Process lifecycle manager: one supervised backend child per task.

mod io_pump;
mod output;
mod run;
mod stream;
mod supervise;
mod types;

pub use io_pump::{LineStream, LineTap};
pub use output::{NullSink, OutputSink};
pub use run::run_process;
pub use stream::StreamDecoder;
pub use supervise::{normalize_exit, Lifecycle, Supervised};
pub use types::{Interrupt, LaunchSpec, ProcessOutcome, RunControl};
