use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{QuestionId, TestId};
use crate::model::question::Question;
use crate::model::subject::Subject;
use crate::scoring::POINTS_PER_CORRECT;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestError {
    #[error("test title cannot be empty")]
    EmptyTitle,

    #[error("grade must be > 0")]
    InvalidGrade,

    #[error("duration must be > 0 minutes")]
    InvalidDuration,

    #[error("test must contain at least one question")]
    NoQuestions,

    #[error("question id {0} appears more than once")]
    DuplicateQuestion(QuestionId),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A test as authored by an administrator, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDraft {
    pub title: String,
    pub subject: Subject,
    pub grade: u32,
    pub duration_minutes: u32,
    pub questions: Vec<Question>,
}

impl TestDraft {
    /// Checks the test-level invariants. Questions validate themselves on
    /// construction.
    ///
    /// # Errors
    ///
    /// Returns the first `TestError` found.
    pub fn validate(&self) -> Result<(), TestError> {
        if self.title.trim().is_empty() {
            return Err(TestError::EmptyTitle);
        }
        if self.grade == 0 {
            return Err(TestError::InvalidGrade);
        }
        if self.duration_minutes == 0 {
            return Err(TestError::InvalidDuration);
        }
        if self.questions.is_empty() {
            return Err(TestError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        for question in &self.questions {
            if !seen.insert(question.id()) {
                return Err(TestError::DuplicateQuestion(question.id()));
            }
        }
        Ok(())
    }
}

//
// ─── TEST ──────────────────────────────────────────────────────────────────────
//

/// A timed subject test made of multiple-choice questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    id: TestId,
    title: String,
    subject: Subject,
    grade: u32,
    duration_minutes: u32,
    questions: Vec<Question>,
}

impl Test {
    /// Creates a test from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if the draft violates any invariant.
    pub fn new(id: TestId, draft: TestDraft) -> Result<Self, TestError> {
        draft.validate()?;
        let TestDraft {
            title,
            subject,
            grade,
            duration_minutes,
            questions,
        } = draft;
        Ok(Self {
            id,
            title,
            subject,
            grade,
            duration_minutes,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> TestId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn grade(&self) -> u32 {
        self.grade
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Countdown budget for one attempt.
    #[must_use]
    pub fn time_budget_secs(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    /// Most points a single attempt can earn.
    #[must_use]
    pub fn max_points(&self) -> u32 {
        u32::try_from(self.questions.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(POINTS_PER_CORRECT)
    }

    /// Returns the authoring view of this test.
    #[must_use]
    pub fn to_draft(&self) -> TestDraft {
        TestDraft {
            title: self.title.clone(),
            subject: self.subject,
            grade: self.grade,
            duration_minutes: self.duration_minutes,
            questions: self.questions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["a".into(), "b".into()],
            0,
        )
        .unwrap()
    }

    fn draft() -> TestDraft {
        TestDraft {
            title: "Sonlar dunyosi".into(),
            subject: Subject::Math,
            grade: 1,
            duration_minutes: 10,
            questions: vec![question(1), question(2)],
        }
    }

    #[test]
    fn derives_budget_and_max_points() {
        let test = Test::new(TestId::new(1), draft()).unwrap();
        assert_eq!(test.time_budget_secs(), 600);
        assert_eq!(test.max_points(), 10);
        assert_eq!(test.question_count(), 2);
    }

    #[test]
    fn rejects_empty_question_list() {
        let mut d = draft();
        d.questions.clear();
        assert_eq!(Test::new(TestId::new(1), d).unwrap_err(), TestError::NoQuestions);
    }

    #[test]
    fn rejects_zero_grade_and_duration() {
        let mut d = draft();
        d.grade = 0;
        assert_eq!(d.validate().unwrap_err(), TestError::InvalidGrade);

        let mut d = draft();
        d.duration_minutes = 0;
        assert_eq!(d.validate().unwrap_err(), TestError::InvalidDuration);
    }

    #[test]
    fn rejects_blank_title() {
        let mut d = draft();
        d.title = " ".into();
        assert_eq!(d.validate().unwrap_err(), TestError::EmptyTitle);
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let mut d = draft();
        d.questions.push(question(1));
        assert_eq!(
            d.validate().unwrap_err(),
            TestError::DuplicateQuestion(QuestionId::new(1))
        );
    }

    #[test]
    fn draft_round_trip_preserves_fields() {
        let test = Test::new(TestId::new(3), draft()).unwrap();
        assert_eq!(test.to_draft(), draft());
    }
}
