use rand::Rng;

use quiz_core::model::{Question, QuestionError, Test};

use crate::shuffle::shuffled;

/// Presentation order for one session: questions and their options shuffled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    questions: Vec<Question>,
}

impl SessionPlan {
    /// Shuffle the test's questions, then each question's options.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if a shuffled question fails validation.
    pub fn build<R: Rng + ?Sized>(test: &Test, rng: &mut R) -> Result<Self, QuestionError> {
        let questions = shuffled(test.questions(), rng)
            .iter()
            .map(|q| shuffle_options(q, rng))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { questions })
    }

    /// Authored order, nothing shuffled.
    #[cfg(test)]
    pub(crate) fn in_authored_order(test: &Test) -> Self {
        Self {
            questions: test.questions().to_vec(),
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub(crate) fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

/// Shuffles options, tracking the correct one by flag rather than by text so
/// duplicate option texts cannot move it.
fn shuffle_options<R: Rng + ?Sized>(
    question: &Question,
    rng: &mut R,
) -> Result<Question, QuestionError> {
    let flagged: Vec<(String, bool)> = question
        .options()
        .iter()
        .enumerate()
        .map(|(i, text)| (text.clone(), i == question.correct_index()))
        .collect();
    let flagged = shuffled(&flagged, rng);

    let correct = flagged.iter().position(|(_, is_correct)| *is_correct).ok_or(
        QuestionError::CorrectIndexOutOfRange {
            index: question.correct_index(),
            len: flagged.len(),
        },
    )?;
    let options = flagged.into_iter().map(|(text, _)| text).collect();
    question.with_options(options, correct)
}
