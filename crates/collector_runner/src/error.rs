use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("a job is already running")]
    AlreadyRunning,
    #[error("worker script not found (tried: {})", display_paths(.attempted))]
    ScriptNotFound { attempted: Vec<PathBuf> },
    #[error("failed to spawn worker: {0}")]
    SpawnFailure(String),
    #[error("malformed completion payload")]
    MalformedCompletion,
    #[error("no active job")]
    NoActiveJob,
    #[error("failed to terminate worker: {0}")]
    TerminationFailure(String),
    #[error("runner setup failed: {0}")]
    Setup(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
