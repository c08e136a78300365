use crate::{AppState, CompletionSummary, Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::KeywordsChanged(raw) => {
            state.set_keywords_input(raw);
            Vec::new()
        }
        Msg::OutputPathChanged(path) => {
            state.set_output_path(path);
            Vec::new()
        }
        Msg::StartClicked => start_clicked(&mut state),
        Msg::StopClicked => {
            if state.session() == SessionState::Running {
                state.set_session(SessionState::Stopping);
                state.push_log("Stopping the collector...");
                vec![Effect::StopJob]
            } else {
                state.push_log("No running job to stop.");
                Vec::new()
            }
        }
        Msg::JobStarted => {
            if state.session() == SessionState::Starting {
                state.set_session(SessionState::Running);
                state.push_log("Collector is running...");
            }
            Vec::new()
        }
        Msg::StartRejected { reason } => {
            if state.session() == SessionState::Starting {
                state.set_session(SessionState::Idle);
            }
            state.push_log(format!("Could not start the collector: {reason}"));
            Vec::new()
        }
        Msg::JobProgress { text } => {
            state.push_log(text);
            Vec::new()
        }
        Msg::JobCompleted(summary) => {
            for line in completion_lines(&summary) {
                state.push_log(line);
            }
            state.record_completion(summary);
            Vec::new()
        }
        Msg::JobFailed { reason } => {
            // Before spawn a failure is final; afterwards the exit event ends the run.
            if state.session() == SessionState::Starting {
                state.set_session(SessionState::Idle);
            }
            state.push_log(format!("Failed: {reason}"));
            Vec::new()
        }
        Msg::JobExited { code } => {
            state.push_log(exit_line(state.session(), code));
            state.record_exit(code);
            Vec::new()
        }
        Msg::SaveLogClicked => {
            if state.log().is_empty() {
                Vec::new()
            } else {
                vec![Effect::SaveLog {
                    content: state.log().join("\n"),
                }]
            }
        }
        Msg::LogSaved { path } => {
            state.push_log(format!("Log saved to {path}"));
            Vec::new()
        }
        Msg::LogSaveFailed { reason } => {
            state.push_log(format!("Saving the log failed: {reason}"));
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_clicked(state: &mut AppState) -> Vec<Effect> {
    if state.session() != SessionState::Idle {
        state.push_log("A job is already running.");
        return Vec::new();
    }
    let keywords = state.keywords();
    if keywords.is_empty() {
        state.push_log("Enter at least one keyword.");
        return Vec::new();
    }
    let output_path = state.output_path().to_string();
    if output_path.is_empty() {
        state.push_log("Choose where to save the results.");
        return Vec::new();
    }

    state.begin_run();
    state.push_log(format!(
        "Starting collection for {} keyword(s): {}",
        keywords.len(),
        keywords.join(", ")
    ));
    vec![Effect::StartJob {
        keywords,
        output_path,
    }]
}

fn completion_lines(summary: &CompletionSummary) -> Vec<String> {
    let mut lines = vec![
        "Collection finished successfully.".to_string(),
        format!("Collected {} news articles.", summary.articles_count),
        format!("Elapsed time: {}", summary.elapsed_time),
    ];
    if summary.save_success {
        lines.push(format!("Saved to: {}", summary.saved_path));
        if let Some(original) = summary.original_path.as_deref().filter(|_| summary.path_changed) {
            lines.push(format!(
                "Note: the file was saved somewhere other than the requested path ({original})."
            ));
        }
    } else {
        lines.push("Saving the spreadsheet failed. Choose a different output path.".to_string());
    }
    lines
}

fn exit_line(session: SessionState, code: Option<i32>) -> String {
    match (session, code) {
        (SessionState::Stopping, _) => "Collector stopped.".to_string(),
        // Idle here means the start already failed before the worker ran.
        (SessionState::Idle, _) => "Collector did not start.".to_string(),
        (_, Some(0)) => "Collector exited normally.".to_string(),
        (_, Some(code)) => format!("Collector exited with code {code}."),
        (_, None) => "Collector was terminated.".to_string(),
    }
}
