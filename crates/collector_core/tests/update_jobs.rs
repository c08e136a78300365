use collector_core::{update, AppState, CompletionSummary, Msg, SessionState};

fn running_state() -> AppState {
    let (state, _) = update(AppState::new(), Msg::KeywordsChanged("rust".into()));
    let (state, _) = update(state, Msg::OutputPathChanged("/tmp/out.xlsx".into()));
    let (state, _) = update(state, Msg::StartClicked);
    let (state, _) = update(state, Msg::JobStarted);
    state
}

fn tail(state: &AppState, n: usize) -> Vec<&str> {
    let log = state.log();
    log[log.len().saturating_sub(n)..]
        .iter()
        .map(String::as_str)
        .collect()
}

#[test]
fn full_run_renders_progress_completion_and_exit() {
    let state = running_state();
    assert_eq!(state.session(), SessionState::Running);

    let (state, _) = update(
        state,
        Msg::JobProgress {
            text: "STATUS: keyword 1/1".into(),
        },
    );
    let summary = CompletionSummary {
        articles_count: 5,
        elapsed_time: "0분 42초".into(),
        save_success: true,
        saved_path: "/tmp/out.xlsx".into(),
        original_path: Some("/tmp/out.xlsx".into()),
        path_changed: false,
    };
    let (state, _) = update(state, Msg::JobCompleted(summary.clone()));
    assert_eq!(
        tail(&state, 5),
        vec![
            "STATUS: keyword 1/1",
            "Collection finished successfully.",
            "Collected 5 news articles.",
            "Elapsed time: 0분 42초",
            "Saved to: /tmp/out.xlsx",
        ]
    );
    // Completion alone does not end the session.
    assert_eq!(state.session(), SessionState::Running);

    let (state, _) = update(state, Msg::JobExited { code: Some(0) });
    let view = state.view();
    assert_eq!(view.session, SessionState::Idle);
    assert!(view.can_start);
    assert_eq!(view.last_completion, Some(summary));
    assert_eq!(view.last_exit_code, Some(0));
    assert_eq!(tail(&state, 1), vec!["Collector exited normally."]);
}

#[test]
fn relocated_and_failed_saves_are_explained() {
    let relocated = CompletionSummary {
        articles_count: 3,
        save_success: true,
        saved_path: "/home/u/news.xlsx".into(),
        original_path: Some("/locked/news.xlsx".into()),
        path_changed: true,
        ..CompletionSummary::default()
    };
    let (state, _) = update(running_state(), Msg::JobCompleted(relocated));
    assert_eq!(
        tail(&state, 2),
        vec![
            "Saved to: /home/u/news.xlsx",
            "Note: the file was saved somewhere other than the requested path (/locked/news.xlsx).",
        ]
    );

    let failed_save = CompletionSummary::default();
    let (state, _) = update(running_state(), Msg::JobCompleted(failed_save));
    assert_eq!(
        tail(&state, 1),
        vec!["Saving the spreadsheet failed. Choose a different output path."]
    );
}

#[test]
fn failure_while_running_keeps_session_until_exit() {
    let (state, _) = update(
        running_state(),
        Msg::JobFailed {
            reason: "malformed completion payload".into(),
        },
    );
    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(tail(&state, 1), vec!["Failed: malformed completion payload"]);

    let (state, _) = update(state, Msg::JobExited { code: Some(2) });
    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(tail(&state, 1), vec!["Collector exited with code 2."]);
}

#[test]
fn failure_before_spawn_returns_to_idle_and_late_exit_is_explained() {
    let (state, _) = update(AppState::new(), Msg::KeywordsChanged("rust".into()));
    let (state, _) = update(state, Msg::OutputPathChanged("/tmp/out.xlsx".into()));
    let (state, _) = update(state, Msg::StartClicked);

    let (state, _) = update(
        state,
        Msg::JobFailed {
            reason: "failed to spawn worker: No such file or directory".into(),
        },
    );
    assert_eq!(state.session(), SessionState::Idle);
    let (state, _) = update(state, Msg::JobExited { code: None });
    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(
        tail(&state, 2),
        vec![
            "Failed: failed to spawn worker: No such file or directory",
            "Collector did not start."
        ]
    );
    assert_eq!(state.view().last_exit_code, None);
}
