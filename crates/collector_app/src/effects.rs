use std::time::Duration;

use collector_core::{CompletionSummary, Effect, Msg};
use collector_logging::{collector_error, collector_info, collector_warn};
use collector_runner::{CompletionReport, JobRequest, JobRunner, RunnerError, RunnerEvent, StatusEvent};

use crate::log_export::LogExport;

/// Executes core effects against the job runner and turns runner events into messages.
pub struct EffectRunner {
    runner: JobRunner,
    log_export: Option<LogExport>,
}

impl EffectRunner {
    pub fn new(runner: JobRunner, log_export: Option<LogExport>) -> Self {
        Self { runner, log_export }
    }

    /// Apply one effect; returns the messages it produces synchronously.
    pub fn apply(&self, effect: Effect) -> Vec<Msg> {
        match effect {
            Effect::StartJob {
                keywords,
                output_path,
            } => {
                let request = JobRequest::new(keywords, output_path);
                match self.runner.start(&request) {
                    Ok(job_id) => {
                        collector_info!("StartJob job_id={} output={}", job_id, request.output_path());
                        vec![Msg::JobStarted]
                    }
                    // Already reported through the event stream.
                    Err(RunnerError::ScriptNotFound { .. }) | Err(RunnerError::SpawnFailure(_)) => {
                        Vec::new()
                    }
                    Err(err) => {
                        collector_warn!("StartJob rejected: {}", err);
                        vec![Msg::StartRejected {
                            reason: err.to_string(),
                        }]
                    }
                }
            }
            Effect::StopJob => {
                if let Err(err) = self.runner.stop() {
                    collector_info!("StopJob: {}", err);
                }
                Vec::new()
            }
            Effect::SaveLog { content } => match &self.log_export {
                None => vec![Msg::LogSaveFailed {
                    reason: "no log directory configured".to_string(),
                }],
                Some(export) => match export.save(&content) {
                    Ok(path) => vec![Msg::LogSaved {
                        path: path.display().to_string(),
                    }],
                    Err(err) => {
                        collector_error!("Saving session log failed: {}", err);
                        vec![Msg::LogSaveFailed {
                            reason: err.to_string(),
                        }]
                    }
                },
            },
        }
    }

    pub fn next_message(&self, timeout: Duration) -> Option<Msg> {
        self.runner.recv_timeout(timeout).map(map_event)
    }

    pub fn shutdown(&self) {
        self.runner.shutdown();
    }
}

fn map_event(event: RunnerEvent) -> Msg {
    match event.status {
        StatusEvent::Progress { text } => Msg::JobProgress { text },
        StatusEvent::Completed(report) => Msg::JobCompleted(map_completion(report)),
        StatusEvent::Failed { reason } => Msg::JobFailed { reason },
        StatusEvent::ProcessExited { code } => Msg::JobExited { code },
    }
}

fn map_completion(report: CompletionReport) -> CompletionSummary {
    CompletionSummary {
        articles_count: report.articles_count,
        elapsed_time: report.elapsed_time,
        save_success: report.save_success,
        saved_path: report.excel_path,
        original_path: report.original_path,
        path_changed: report.path_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_map_onto_messages() {
        let completed = RunnerEvent {
            job_id: Some(1),
            status: StatusEvent::Completed(CompletionReport {
                articles_count: 7,
                elapsed_time: "1분 2초".into(),
                save_success: true,
                excel_path: "/out.xlsx".into(),
                original_path: Some("/locked.xlsx".into()),
                path_changed: true,
            }),
        };
        assert_eq!(
            map_event(completed),
            Msg::JobCompleted(CompletionSummary {
                articles_count: 7,
                elapsed_time: "1분 2초".into(),
                save_success: true,
                saved_path: "/out.xlsx".into(),
                original_path: Some("/locked.xlsx".into()),
                path_changed: true,
            })
        );
        assert_eq!(
            map_event(RunnerEvent {
                job_id: None,
                status: StatusEvent::Progress {
                    text: "no active job to stop".into()
                },
            }),
            Msg::JobProgress {
                text: "no active job to stop".into()
            }
        );
        assert_eq!(
            map_event(RunnerEvent {
                job_id: Some(2),
                status: StatusEvent::ProcessExited { code: Some(1) },
            }),
            Msg::JobExited { code: Some(1) }
        );
    }

    #[test]
    fn invalid_start_is_rejected_as_message() {
        let runner = JobRunner::new(collector_runner::RunnerConfig::default()).unwrap();
        let effects = EffectRunner::new(runner, None);

        let msgs = effects.apply(Effect::StartJob {
            keywords: vec![" ".into()],
            output_path: "/tmp/out.xlsx".into(),
        });
        assert!(matches!(msgs.as_slice(), [Msg::StartRejected { .. }]));

        assert!(matches!(
            effects.apply(Effect::SaveLog {
                content: "x".into()
            })
            .as_slice(),
            [Msg::LogSaveFailed { .. }]
        ));
    }
}
