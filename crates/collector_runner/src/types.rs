use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::RunnerError;

pub type JobId = u64;

/// Keywords and destination for one collection run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    keywords: Vec<String>,
    output_path: String,
}

impl JobRequest {
    pub fn new<I, S>(keywords: I, output_path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            output_path: output_path.into(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// Trimmed, non-blank keywords joined with commas: the worker's first argument.
    pub fn joined_keywords(&self) -> String {
        self.keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.joined_keywords().is_empty() {
            return Err(RunnerError::InvalidRequest(
                "at least one keyword is required".into(),
            ));
        }
        if self.output_path.trim().is_empty() {
            return Err(RunnerError::InvalidRequest("output path is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSource {
    Primary,
    Fallback(usize),
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptSource::Primary => write!(f, "primary"),
            ScriptSource::Fallback(index) => write!(f, "fallback #{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScript {
    pub path: PathBuf,
    pub source: ScriptSource,
}

/// Observable position of the runner's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    #[default]
    Idle,
    Running,
    Stopping,
}

/// The single worker process the runner currently tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningJob {
    pub job_id: JobId,
    /// `None` once the OS no longer reports an id for the child.
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub script: ResolvedScript,
}

/// Structured payload of a completion-marker line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionReport {
    pub articles_count: u64,
    pub elapsed_time: String,
    pub save_success: bool,
    pub excel_path: String,
    pub original_path: Option<String>,
    pub path_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Progress { text: String },
    Completed(CompletionReport),
    Failed { reason: String },
    /// Last event of a job; emitted exactly once.
    ProcessExited { code: Option<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerEvent {
    /// `None` for notices not tied to a spawned worker.
    pub job_id: Option<JobId>,
    pub status: StatusEvent,
}
