use quiz_core::model::{Test, TestDraft, TestId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_test_row, questions_to_json, ser};
use crate::repository::{StorageError, TestRepository};

#[async_trait::async_trait]
impl TestRepository for SqliteRepository {
    async fn get_test(&self, id: TestId) -> Result<Option<Test>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, subject, grade, duration_minutes, questions
            FROM tests WHERE id = ?1
            ",
        )
        .bind(id_to_i64("test_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_test_row).transpose()
    }

    async fn list_tests(&self) -> Result<Vec<Test>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, subject, grade, duration_minutes, questions
            FROM tests
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_test_row).collect()
    }

    async fn insert_new_test(&self, draft: &TestDraft) -> Result<TestId, StorageError> {
        draft.validate().map_err(ser)?;
        let res = sqlx::query(
            r"
            INSERT INTO tests (title, subject, grade, duration_minutes, questions)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(&draft.title)
        .bind(draft.subject.label())
        .bind(i64::from(draft.grade))
        .bind(i64::from(draft.duration_minutes))
        .bind(questions_to_json(&draft.questions)?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("test id sign overflow".into()))?;
        Ok(TestId::new(id))
    }

    async fn upsert_test(&self, test: &Test) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO tests (id, title, subject, grade, duration_minutes, questions)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                subject = excluded.subject,
                grade = excluded.grade,
                duration_minutes = excluded.duration_minutes,
                questions = excluded.questions
            ",
        )
        .bind(id_to_i64("test_id", test.id().value())?)
        .bind(test.title())
        .bind(test.subject().label())
        .bind(i64::from(test.grade()))
        .bind(i64::from(test.duration_minutes()))
        .bind(questions_to_json(test.questions())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_test(&self, id: TestId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM tests WHERE id = ?1")
            .bind(id_to_i64("test_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
