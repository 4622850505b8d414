//! Staff account methods on Repository

use chrono::{DateTime, Utc};

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::staff::StaffUser,
};

impl Repository {
    /// Get an active staff account by username
    pub async fn staff_get_by_username(&self, username: &str) -> AppResult<Option<StaffUser>> {
        let row = sqlx::query_as::<_, StaffUser>(
            "SELECT * FROM staff_users WHERE username = $1 AND is_active = TRUE",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn staff_get_by_id(&self, id: i32) -> AppResult<StaffUser> {
        sqlx::query_as::<_, StaffUser>("SELECT * FROM staff_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Staff user {} not found", id)))
    }

    pub async fn staff_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*)::bigint FROM staff_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Create a staff account
    pub async fn staff_create(&self, username: &str, password_hash: &str) -> AppResult<StaffUser> {
        let row = sqlx::query_as::<_, StaffUser>(
            r#"
            INSERT INTO staff_users (username, password_hash, is_staff, is_active)
            VALUES ($1, $2, TRUE, TRUE)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn staff_touch_last_login(&self, id: i32, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE staff_users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
