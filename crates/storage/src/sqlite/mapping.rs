use quiz_core::model::{
    Question, QuestionId, ResultId, Subject, Test, TestDraft, TestId, TestResult, User, UserId,
    UserRole,
};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{ResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Stored shape of one question inside the `tests.questions` JSON column.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionRecord {
    id: u64,
    text: String,
    options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    correct_answer: usize,
}

impl QuestionRecord {
    fn from_question(q: &Question) -> Self {
        Self {
            id: q.id().value(),
            text: q.prompt().to_owned(),
            options: q.options().to_vec(),
            correct_answer: q.correct_index(),
        }
    }

    fn into_question(self) -> Result<Question, StorageError> {
        Question::new(
            QuestionId::new(self.id),
            self.text,
            self.options,
            self.correct_answer,
        )
        .map_err(ser)
    }
}

pub(crate) fn questions_to_json(questions: &[Question]) -> Result<String, StorageError> {
    let records: Vec<QuestionRecord> = questions.iter().map(QuestionRecord::from_question).collect();
    serde_json::to_string(&records).map_err(ser)
}

fn questions_from_json(raw: &str) -> Result<Vec<Question>, StorageError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(raw).map_err(ser)?;
    records
        .into_iter()
        .map(QuestionRecord::into_question)
        .collect()
}

fn subject_from_row(row: &SqliteRow) -> Result<Subject, StorageError> {
    let label: String = row.try_get("subject").map_err(ser)?;
    label.parse::<Subject>().map_err(ser)
}

pub(crate) fn map_test_row(row: &SqliteRow) -> Result<Test, StorageError> {
    let id = TestId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let questions_raw: String = row.try_get("questions").map_err(ser)?;

    let draft = TestDraft {
        title: row.try_get("title").map_err(ser)?,
        subject: subject_from_row(row)?,
        grade: i64_to_u32("grade", row.try_get("grade").map_err(ser)?)?,
        duration_minutes: i64_to_u32(
            "duration_minutes",
            row.try_get("duration_minutes").map_err(ser)?,
        )?,
        questions: questions_from_json(&questions_raw)?,
    };

    Test::new(id, draft).map_err(ser)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let role: String = row.try_get("role").map_err(ser)?;
    let grade = row
        .try_get::<Option<i64>, _>("grade")
        .map_err(ser)?
        .map(|g| i64_to_u32("grade", g))
        .transpose()?;

    User::from_persisted(
        UserId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?),
        role.parse::<UserRole>().map_err(ser)?,
        row.try_get::<String, _>("display_name").map_err(ser)?,
        grade,
        row.try_get::<Option<String>, _>("avatar").map_err(ser)?,
        i64_to_u32("points", row.try_get("points").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_result_row(row: &SqliteRow) -> Result<ResultRow, StorageError> {
    let result = TestResult::from_persisted(
        UserId::new(i64_to_u64("user_id", row.try_get("user_id").map_err(ser)?)?),
        TestId::new(i64_to_u64("test_id", row.try_get("test_id").map_err(ser)?)?),
        subject_from_row(row)?,
        i64_to_u32("score", row.try_get("score").map_err(ser)?)?,
        i64_to_u32(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)?;

    let id = ResultId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    Ok(ResultRow::new(id, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_json_uses_document_field_names() {
        let q = Question::new(
            QuestionId::new(3),
            "5 + 3?",
            vec!["7".into(), "8".into()],
            1,
        )
        .unwrap();
        let json = questions_to_json(std::slice::from_ref(&q)).unwrap();
        assert!(json.contains("\"correctAnswer\":1"));
        assert!(json.contains("\"text\":\"5 + 3?\""));

        let back = questions_from_json(&json).unwrap();
        assert_eq!(back, vec![q]);
    }

    #[test]
    fn invalid_question_json_is_a_serialization_error() {
        let raw = r#"[{"id":1,"text":"Q","options":["a"],"correctAnswer":0}]"#;
        assert!(matches!(
            questions_from_json(raw),
            Err(StorageError::Serialization(_))
        ));
    }
}
