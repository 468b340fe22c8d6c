use quiz_core::model::{User, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_user_row, ser};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, role, display_name, grade, avatar, points
            FROM users WHERE id = ?1
            ",
        )
        .bind(id_to_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO users (id, role, display_name, grade, avatar, points)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                role = excluded.role,
                display_name = excluded.display_name,
                grade = excluded.grade,
                avatar = excluded.avatar,
                points = excluded.points
            ",
        )
        .bind(id_to_i64("user_id", user.id().value())?)
        .bind(user.role().as_str())
        .bind(user.display_name())
        .bind(user.grade().map(i64::from))
        .bind(user.avatar())
        .bind(i64::from(user.points()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn insert_new_user(&self, user: &User) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (id, role, display_name, grade, avatar, points)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(id_to_i64("user_id", user.id().value())?)
        .bind(user.role().as_str())
        .bind(user.display_name())
        .bind(user.grade().map(i64::from))
        .bind(user.avatar())
        .bind(i64::from(user.points()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE users
            SET display_name = ?1, grade = ?2, avatar = ?3
            WHERE id = ?4
            ",
        )
        .bind(user.display_name())
        .bind(user.grade().map(i64::from))
        .bind(user.avatar())
        .bind(id_to_i64("user_id", user.id().value())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn credit_points(&self, id: UserId, delta: u32) -> Result<u32, StorageError> {
        // Single statement so the increment is atomic on the store side.
        // Saturates at u32::MAX inside the statement.
        let row = sqlx::query(
            r"
            UPDATE users
            SET points = MIN(points + ?1, 4294967295)
            WHERE id = ?2
            RETURNING points
            ",
        )
        .bind(i64::from(delta))
        .bind(id_to_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let points: i64 = row.try_get("points").map_err(ser)?;
        u32::try_from(points)
            .map_err(|_| StorageError::Serialization(format!("invalid points: {points}")))
    }

    async fn list_users_by_points(&self, limit: u32) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, role, display_name, grade, avatar, points
            FROM users
            ORDER BY points DESC, id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_user_row).collect()
    }

    async fn reset_points(&self) -> Result<u64, StorageError> {
        let res = sqlx::query("UPDATE users SET points = 0")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected())
    }
}
