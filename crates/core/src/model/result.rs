use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{TestId, UserId};
use crate::model::subject::Subject;
use crate::scoring::{POINTS_PER_CORRECT, Score};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("result must cover at least one question")]
    NoQuestions,

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// Outcome of one finished attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    user_id: UserId,
    test_id: TestId,
    subject: Subject,
    score: u32,
    total_questions: u32,
    completed_at: DateTime<Utc>,
}

impl TestResult {
    /// Build a result from a computed score.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the score is inconsistent.
    pub fn new(
        user_id: UserId,
        test_id: TestId,
        subject: Subject,
        score: Score,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        Self::from_persisted(
            user_id,
            test_id,
            subject,
            score.correct,
            score.total,
            completed_at,
        )
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::NoQuestions` for a zero total and
    /// `ResultError::ScoreExceedsTotal` when the counts do not align.
    pub fn from_persisted(
        user_id: UserId,
        test_id: TestId,
        subject: Subject,
        score: u32,
        total_questions: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if total_questions == 0 {
            return Err(ResultError::NoQuestions);
        }
        if score > total_questions {
            return Err(ResultError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        Ok(Self {
            user_id,
            test_id,
            subject,
            score,
            total_questions,
            completed_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Points this result was worth.
    #[must_use]
    pub fn points(&self) -> u32 {
        self.score.saturating_mul(POINTS_PER_CORRECT)
    }

    /// Share of correct answers in percent, unrounded.
    #[must_use]
    pub fn percent(&self) -> f64 {
        f64::from(self.score) / f64::from(self.total_questions) * 100.0
    }
}
