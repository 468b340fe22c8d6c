use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;

use quiz_core::model::{Question, ResultId, SubmissionKey, Test, TestResult, UserId};
use quiz_core::scoring;

use super::plan::SessionPlan;
use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Externally visible lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Submitting,
    Finished,
}

/// Result of a one-second timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// The countdown is at zero.
    Expired,
    /// The session is no longer active; nothing changed.
    Stopped,
}

/// What a finished session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishOutcome {
    pub result_id: ResultId,
    pub result: TestResult,
    pub points_awarded: u32,
    pub total_points: u32,
}

/// Snapshot of a submission in progress, handed to the finish workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingSubmission {
    pub key: SubmissionKey,
    pub result: TestResult,
    pub result_id: Option<ResultId>,
}

#[derive(Debug, Clone)]
enum Phase {
    Active,
    /// The key is fixed for the whole attempt so a replayed append after a
    /// cancelled finish lands on the same stored row.
    Submitting {
        key: SubmissionKey,
        result: TestResult,
        result_id: Option<ResultId>,
    },
    Finished(FinishOutcome),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's attempt at one test.
///
/// Owns the shuffled presentation, the answers and the countdown. Store
/// effects happen only through `SessionLoopService::finish`.
pub struct TestSession {
    test: Test,
    user_id: UserId,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    position: usize,
    remaining_secs: u32,
    started_at: DateTime<Utc>,
    phase: Phase,
}

impl TestSession {
    /// Start a session with a freshly shuffled presentation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invalid` if shuffling produces an invalid question.
    pub fn start<R: Rng + ?Sized>(
        test: Test,
        user_id: UserId,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let plan = SessionPlan::build(&test, rng).map_err(quiz_core::Error::from)?;
        Ok(Self::from_plan(test, user_id, plan, started_at))
    }

    #[must_use]
    pub(crate) fn from_plan(
        test: Test,
        user_id: UserId,
        plan: SessionPlan,
        started_at: DateTime<Utc>,
    ) -> Self {
        let questions = plan.into_questions();
        let answers = vec![None; questions.len()];
        let remaining_secs = test.time_budget_secs();
        Self {
            test,
            user_id,
            questions,
            answers,
            position: 0,
            remaining_secs,
            started_at,
            phase: Phase::Active,
        }
    }

    #[must_use]
    pub fn test(&self) -> &Test {
        &self.test
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Questions in presentation order, options already shuffled.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.position)
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.answers.get(self.position).copied().flatten()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.position + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Active => SessionState::Active,
            Phase::Submitting { .. } => SessionState::Submitting,
            Phase::Finished(_) => SessionState::Finished,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// The stored outcome once the session has finished.
    #[must_use]
    pub fn outcome(&self) -> Option<&FinishOutcome> {
        match &self.phase {
            Phase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.answered_count();
        SessionProgress {
            total: self.total_questions(),
            answered,
            unanswered: self.total_questions().saturating_sub(answered),
            is_finished: self.is_finished(),
        }
    }

    /// Record an answer for the current question, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OptionOutOfRange` for an index past the option
    /// list, or `Submitting`/`Finished` once the session is no longer active.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_active()?;
        let len = self
            .current_question()
            .map_or(0, |question| question.options().len());
        if index >= len {
            return Err(SessionError::OptionOutOfRange { index, len });
        }
        self.answers[self.position] = Some(index);
        Ok(())
    }

    /// Move to the next question. Requires an answer on the current one.
    ///
    /// Returns whether the position changed.
    ///
    /// # Errors
    ///
    /// Returns `Submitting`/`Finished` once the session is no longer active.
    pub fn advance(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        if self.selected_option().is_none() || self.is_last() {
            return Ok(false);
        }
        self.position += 1;
        Ok(true)
    }

    /// Move to the previous question.
    ///
    /// Returns whether the position changed.
    ///
    /// # Errors
    ///
    /// Returns `Submitting`/`Finished` once the session is no longer active.
    pub fn retreat(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        if self.position == 0 {
            return Ok(false);
        }
        self.position -= 1;
        Ok(true)
    }

    /// Count down one second, saturating at zero.
    pub fn tick(&mut self) -> TickOutcome {
        if !matches!(self.phase, Phase::Active) {
            return TickOutcome::Stopped;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running
        }
    }

    /// Drop the session without touching the store.
    pub fn abandon(self) {
        tracing::debug!(
            test_id = %self.test.id(),
            user_id = %self.user_id,
            answered = self.answered_count(),
            "session abandoned"
        );
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Submitting { .. } => Err(SessionError::Submitting),
            Phase::Finished(_) => Err(SessionError::Finished),
        }
    }

    /// Freeze the result (first call) or hand back the one already frozen.
    pub(crate) fn begin_submission(
        &mut self,
        completed_at: DateTime<Utc>,
    ) -> Result<PendingSubmission, SessionError> {
        match &self.phase {
            Phase::Active => {
                let score = scoring::score(&self.questions, &self.answers);
                let result = TestResult::new(
                    self.user_id,
                    self.test.id(),
                    self.test.subject(),
                    score,
                    completed_at,
                )
                .map_err(quiz_core::Error::from)?;
                let key = SubmissionKey::generate();
                self.phase = Phase::Submitting {
                    key,
                    result: result.clone(),
                    result_id: None,
                };
                Ok(PendingSubmission {
                    key,
                    result,
                    result_id: None,
                })
            }
            Phase::Submitting {
                key,
                result,
                result_id,
            } => Ok(PendingSubmission {
                key: *key,
                result: result.clone(),
                result_id: *result_id,
            }),
            Phase::Finished(_) => Err(SessionError::Finished),
        }
    }

    pub(crate) fn record_result_id(&mut self, id: ResultId) {
        if let Phase::Submitting { result_id, .. } = &mut self.phase {
            *result_id = Some(id);
        }
    }

    /// Back to `Active` after the store rejected the append. The next
    /// submission draws a new key.
    pub(crate) fn abort_submission(&mut self) {
        if matches!(
            self.phase,
            Phase::Submitting {
                result_id: None,
                ..
            }
        ) {
            self.phase = Phase::Active;
        }
    }

    pub(crate) fn complete(&mut self, outcome: FinishOutcome) {
        self.phase = Phase::Finished(outcome);
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("test_id", &self.test.id())
            .field("user_id", &self.user_id)
            .field("questions_len", &self.questions.len())
            .field("position", &self.position)
            .field("answered", &self.answered_count())
            .field("remaining_secs", &self.remaining_secs)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
