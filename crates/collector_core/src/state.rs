use crate::view_model::AppViewModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
}

/// What the worker reported when it finished.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionSummary {
    pub articles_count: u64,
    pub elapsed_time: String,
    pub save_success: bool,
    pub saved_path: String,
    pub original_path: Option<String>,
    pub path_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    keywords_input: String,
    output_path: String,
    log: Vec<String>,
    last_completion: Option<CompletionSummary>,
    last_exit_code: Option<i32>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn keywords(&self) -> Vec<String> {
        parse_keywords(&self.keywords_input)
    }

    pub fn output_path(&self) -> &str {
        self.output_path.trim()
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            keywords: self.keywords(),
            output_path: self.output_path().to_string(),
            log_lines: self.log.clone(),
            can_start: self.session == SessionState::Idle,
            can_stop: self.session == SessionState::Running,
            last_completion: self.last_completion.clone(),
            last_exit_code: self.last_exit_code,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_keywords_input(&mut self, raw: String) {
        if self.keywords_input != raw {
            self.keywords_input = raw;
            self.dirty = true;
        }
    }

    pub(crate) fn set_output_path(&mut self, path: String) {
        if self.output_path != path {
            self.output_path = path;
            self.dirty = true;
        }
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        if self.session != session {
            self.session = session;
            self.dirty = true;
        }
    }

    pub(crate) fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        self.dirty = true;
    }

    pub(crate) fn begin_run(&mut self) {
        self.last_completion = None;
        self.last_exit_code = None;
        self.set_session(SessionState::Starting);
    }

    pub(crate) fn record_completion(&mut self, summary: CompletionSummary) {
        self.last_completion = Some(summary);
        self.dirty = true;
    }

    pub(crate) fn record_exit(&mut self, code: Option<i32>) {
        self.last_exit_code = code;
        self.set_session(SessionState::Idle);
    }
}

/// Split raw keyword input on commas and newlines; trims and drops blanks.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
