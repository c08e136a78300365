//! Collector runner: launches the keyword-collection worker, classifies its
//! output and terminates it on request.
mod config;
mod decode;
mod error;
mod protocol;
mod resolve;
mod runner;
mod terminate;
mod types;

pub use config::RunnerConfig;
pub use decode::{DecodeError, LineDecoder};
pub use error::RunnerError;
pub use protocol::{classify_stderr_line, classify_stdout_line, parse_completion, COMPLETION_MARKER};
pub use resolve::{resolve_script, resolve_with, ResolveError};
pub use runner::JobRunner;
pub use terminate::{ProcessTerminator, SystemTerminator, TerminateError};
pub use types::{
    CompletionReport, JobId, JobRequest, ResolvedScript, RunnerEvent, RunnerState, RunningJob,
    ScriptSource, StatusEvent,
};
