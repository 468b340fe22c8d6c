mod ids;
mod question;
mod result;
mod subject;
mod test;
mod user;

pub use ids::{ParseIdError, QuestionId, ResultId, SubmissionKey, TestId, UserId};
pub use question::{MIN_OPTIONS, Question, QuestionError};
pub use result::{ResultError, TestResult};
pub use subject::{Subject, SubjectError};
pub use test::{Test, TestDraft, TestError};
pub use user::{User, UserError, UserRole};
