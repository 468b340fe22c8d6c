use quiz_core::model::{ResultId, SubmissionKey, TestResult, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_result_row, ser};
use crate::repository::{ResultRepository, ResultRow, StorageError};

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(
        &self,
        key: SubmissionKey,
        result: &TestResult,
    ) -> Result<ResultId, StorageError> {
        // The no-op update makes RETURNING yield the existing row on replay.
        let row = sqlx::query(
            r"
                INSERT INTO results (
                    submission_key, user_id, test_id, subject, score,
                    total_questions, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(submission_key) DO UPDATE SET
                    submission_key = excluded.submission_key
                RETURNING id
            ",
        )
        .bind(key.to_string())
        .bind(id_to_i64("user_id", result.user_id().value())?)
        .bind(id_to_i64("test_id", result.test_id().value())?)
        .bind(result.subject().label())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(result.completed_at())
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let id: i64 = row.try_get("id").map_err(ser)?;
        let id = u64::try_from(id)
            .map_err(|_| StorageError::Serialization("result id sign overflow".into()))?;
        Ok(ResultId::new(id))
    }

    async fn list_user_results(&self, user_id: UserId) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, test_id, subject, score, total_questions, completed_at
                FROM results
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn list_recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, test_id, subject, score, total_questions, completed_at
                FROM results
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn clear_results(&self) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM results")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected())
    }
}
