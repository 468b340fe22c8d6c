//! Pure scoring of an attempt.

use crate::model::Question;

/// Points awarded per correctly answered question.
pub const POINTS_PER_CORRECT: u32 = 5;

/// Correct answers out of the questions presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    /// Points credited for this score.
    #[must_use]
    pub fn points(self) -> u32 {
        points_for(self.correct)
    }

    /// Share of correct answers in percent (0 for an empty attempt).
    #[must_use]
    pub fn percent(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}

/// Points for a number of correct answers.
#[must_use]
pub fn points_for(correct: u32) -> u32 {
    correct.saturating_mul(POINTS_PER_CORRECT)
}

/// Scores answers against questions in the same (presentation) order.
///
/// `answers[i]` is the selected option index for `questions[i]`, or `None`
/// when unanswered. Missing slots count as unanswered.
#[must_use]
pub fn score(questions: &[Question], answers: &[Option<usize>]) -> Score {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| {
            answers
                .get(*i)
                .copied()
                .flatten()
                .is_some_and(|selected| q.is_correct(selected))
        })
        .count();

    Score {
        correct: u32::try_from(correct).unwrap_or(u32::MAX),
        total: u32::try_from(questions.len()).unwrap_or(u32::MAX),
    }
}
