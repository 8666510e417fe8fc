//! Subprocess plumbing: streaming runner with cancellation and tool lookup.

mod errors;
mod runner;
mod tools;

pub use errors::{ProcessError, ProcessResult};
pub use runner::{run_captured, run_streaming, CancelToken, CapturedOutput, RunOutcome};
pub use tools::{find_executable, is_executable, DEFAULT_SEARCH_DIRS};
