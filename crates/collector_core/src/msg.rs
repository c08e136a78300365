#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the keyword input (comma or newline separated).
    KeywordsChanged(String),
    /// User picked or typed the destination spreadsheet path.
    OutputPathChanged(String),
    /// User clicked Start.
    StartClicked,
    /// User clicked Stop.
    StopClicked,
    /// Runner confirmed the worker was spawned.
    JobStarted,
    /// Runner refused the start request without emitting any event.
    StartRejected { reason: String },
    /// Free-form worker output.
    JobProgress { text: String },
    /// Worker reported its completion payload.
    JobCompleted(crate::CompletionSummary),
    /// Runner reported a failure (bad payload, missing script, spawn or kill error).
    JobFailed { reason: String },
    /// Worker process is gone.
    JobExited { code: Option<i32> },
    /// User asked to export the session log.
    SaveLogClicked,
    LogSaved { path: String },
    LogSaveFailed { reason: String },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
