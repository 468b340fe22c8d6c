use thiserror::Error;

use crate::model::{QuestionError, ResultError, SubjectError, TestError, UserError};

/// Any domain validation failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Test(#[from] TestError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Subject(#[from] SubjectError),
}
