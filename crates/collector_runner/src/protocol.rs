//! Classification of worker output lines.
//!
//! Standard output carries free-form progress text plus one completion line:
//! `TASK_COMPLETED:` immediately followed by a JSON object. Standard error is
//! always progress and never changes job state.

use serde::Deserialize;
use serde_json::Value;

use crate::{CompletionReport, RunnerError, StatusEvent};

pub const COMPLETION_MARKER: &str = "TASK_COMPLETED:";

const STDERR_PREFIX: &str = "error: ";

/// Wire shape of the completion payload. Every field is optional; `null` and
/// absence both fall back to the zero value.
#[derive(Debug, Deserialize)]
struct CompletionPayload {
    articles_count: Option<u64>,
    elapsed_time: Option<String>,
    save_success: Option<bool>,
    excel_path: Option<String>,
    original_path: Option<String>,
    path_changed: Option<bool>,
}

impl From<CompletionPayload> for CompletionReport {
    fn from(payload: CompletionPayload) -> Self {
        Self {
            articles_count: payload.articles_count.unwrap_or(0),
            elapsed_time: payload.elapsed_time.unwrap_or_default(),
            save_success: payload.save_success.unwrap_or(false),
            excel_path: payload.excel_path.unwrap_or_default(),
            original_path: payload.original_path.filter(|path| !path.is_empty()),
            path_changed: payload.path_changed.unwrap_or(false),
        }
    }
}

/// Parse the text after the completion marker.
pub fn parse_completion(payload: &str) -> Result<CompletionReport, RunnerError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|_| RunnerError::MalformedCompletion)?;
    if !value.is_object() {
        return Err(RunnerError::MalformedCompletion);
    }
    serde_json::from_value::<CompletionPayload>(value)
        .map(CompletionReport::from)
        .map_err(|_| RunnerError::MalformedCompletion)
}

/// Events for one line of standard output, in emission order.
pub fn classify_stdout_line(line: &str) -> Vec<StatusEvent> {
    let line = line.trim();
    let Some(payload) = line.strip_prefix(COMPLETION_MARKER) else {
        return vec![StatusEvent::Progress {
            text: line.to_string(),
        }];
    };

    match parse_completion(payload) {
        Ok(report) => vec![StatusEvent::Completed(report)],
        Err(err) => vec![
            StatusEvent::Failed {
                reason: err.to_string(),
            },
            StatusEvent::Progress {
                text: line.to_string(),
            },
        ],
    }
}

pub fn classify_stderr_line(line: &str) -> StatusEvent {
    StatusEvent::Progress {
        text: format!("{STDERR_PREFIX}{}", line.trim()),
    }
}
