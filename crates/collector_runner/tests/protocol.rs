use collector_runner::{
    classify_stderr_line, classify_stdout_line, parse_completion, CompletionReport, RunnerError,
    StatusEvent,
};
use pretty_assertions::assert_eq;

#[test]
fn plain_line_becomes_single_trimmed_progress() {
    let events = classify_stdout_line("  STATUS: keyword 1/3 \r\n");
    assert_eq!(
        events,
        vec![StatusEvent::Progress {
            text: "STATUS: keyword 1/3".to_string()
        }]
    );
}

#[test]
fn marker_not_at_line_start_is_progress() {
    let events = classify_stdout_line("done TASK_COMPLETED:{}");
    assert_eq!(
        events,
        vec![StatusEvent::Progress {
            text: "done TASK_COMPLETED:{}".to_string()
        }]
    );
}

#[test]
fn completion_line_yields_completed_event() {
    let line = r#"TASK_COMPLETED:{"articles_count":5,"elapsed_time":"00:01:02","save_success":true,"excel_path":"/out.xlsx"}"#;
    let events = classify_stdout_line(line);
    assert_eq!(
        events,
        vec![StatusEvent::Completed(CompletionReport {
            articles_count: 5,
            elapsed_time: "00:01:02".to_string(),
            save_success: true,
            excel_path: "/out.xlsx".to_string(),
            original_path: None,
            path_changed: false,
        })]
    );
}

#[test]
fn completion_carries_relocation_and_ignores_extra_fields() {
    let payload = r#"{"status":"completed","articles_count":12,"elapsed_time":"1분 3초","excel_path":"C:\\tmp\\news.xlsx","keywords_count":2,"save_success":true,"path_changed":true,"original_path":"D:\\locked\\news.xlsx"}"#;
    let report = parse_completion(payload).unwrap();
    assert_eq!(report.articles_count, 12);
    assert_eq!(report.elapsed_time, "1분 3초");
    assert_eq!(report.excel_path, "C:\\tmp\\news.xlsx");
    assert!(report.path_changed);
    assert_eq!(report.original_path.as_deref(), Some("D:\\locked\\news.xlsx"));
}

#[test]
fn missing_and_null_fields_default_to_zero_values() {
    let report = parse_completion(r#"{"save_success":false,"excel_path":null}"#).unwrap();
    assert_eq!(report, CompletionReport::default());
}

#[test]
fn malformed_payload_fails_then_forwards_raw_line() {
    let events = classify_stdout_line("TASK_COMPLETED:{not valid json");
    assert_eq!(
        events,
        vec![
            StatusEvent::Failed {
                reason: "malformed completion payload".to_string()
            },
            StatusEvent::Progress {
                text: "TASK_COMPLETED:{not valid json".to_string()
            },
        ]
    );
}

#[test]
fn non_object_payloads_are_malformed() {
    for payload in ["42", "[5, \"00:01\"]", "\"done\"", ""] {
        assert_eq!(
            parse_completion(payload),
            Err(RunnerError::MalformedCompletion),
            "payload {payload:?}"
        );
    }
    assert_eq!(
        parse_completion(r#"{"articles_count":"five"}"#),
        Err(RunnerError::MalformedCompletion)
    );
}

#[test]
fn stderr_lines_are_prefixed_progress() {
    assert_eq!(
        classify_stderr_line("Traceback (most recent call last):\n"),
        StatusEvent::Progress {
            text: "error: Traceback (most recent call last):".to_string()
        }
    );
    // The marker on stderr is not a completion.
    assert!(matches!(
        classify_stderr_line("TASK_COMPLETED:{}"),
        StatusEvent::Progress { .. }
    ));
}
