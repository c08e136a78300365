//! Collector core: pure host session state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{parse_keywords, AppState, CompletionSummary, SessionState};
pub use update::update;
pub use view_model::AppViewModel;
