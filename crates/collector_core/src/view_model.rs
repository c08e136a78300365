use crate::{CompletionSummary, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub keywords: Vec<String>,
    pub output_path: String,
    pub log_lines: Vec<String>,
    pub can_start: bool,
    pub can_stop: bool,
    pub last_completion: Option<CompletionSummary>,
    pub last_exit_code: Option<i32>,
    pub dirty: bool,
}
