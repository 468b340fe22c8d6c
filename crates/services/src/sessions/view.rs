use serde::Serialize;

use quiz_core::model::Subject;
use quiz_core::time::format_countdown;

use super::service::{FinishOutcome, SessionState, TestSession};

/// User actions the presentation layer forwards to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIntent {
    SelectOption(usize),
    Next,
    Previous,
    Submit,
    Tick,
}

/// What a dispatched intent did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Updated,
    Unchanged,
    /// Countdown hit zero and the session keeps running.
    Overtime,
    Finished(FinishOutcome),
}

/// Render-ready snapshot of the current question.
///
/// Built fresh after every intent; holds no reference to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub test_title: String,
    pub subject: Subject,
    /// Zero-based position.
    pub position: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub is_last: bool,
    pub remaining_secs: u32,
    pub countdown: String,
    pub answered: usize,
    pub state: SessionState,
}

impl SessionView {
    #[must_use]
    pub fn from_session(session: &TestSession) -> Self {
        let active = session.state() == SessionState::Active;
        let (prompt, options) = session
            .current_question()
            .map(|q| (q.prompt().to_owned(), q.options().to_vec()))
            .unwrap_or_default();
        let selected = session.selected_option();
        let is_last = session.is_last();

        Self {
            test_title: session.test().title().to_owned(),
            subject: session.test().subject(),
            position: session.position(),
            total: session.total_questions(),
            prompt,
            options,
            selected,
            can_advance: active && selected.is_some() && !is_last,
            can_retreat: active && session.position() > 0,
            is_last,
            remaining_secs: session.remaining_secs(),
            countdown: format_countdown(session.remaining_secs()),
            answered: session.answered_count(),
            state: session.state(),
        }
    }

    /// The submit control is offered on the last question.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.state != SessionState::Finished && self.is_last
    }
}
