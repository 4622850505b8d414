//! Client domain methods on Repository

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::client::{Client, ClientRequest},
};

impl Repository {
    /// List all clients
    pub async fn clients_list(&self) -> AppResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get client by ID
    pub async fn clients_get_by_id(&self, id: i32) -> AppResult<Client> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))
    }

    /// Whether a client exists, within a transaction
    pub async fn clients_exists(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let found: Option<i32> = sqlx::query_scalar("SELECT id FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(found.is_some())
    }

    /// Create client; `tax_id` must already be normalized
    pub async fn clients_create(
        &self,
        data: &ClientRequest,
        tax_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Client> {
        let row = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, tax_id, email, phone, address, birth_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(tax_id)
        .bind(data.email.trim())
        .bind(data.phone.trim())
        .bind(&data.address)
        .bind(data.birth_date)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Replace every field of a client
    pub async fn clients_update(
        &self,
        id: i32,
        data: &ClientRequest,
        tax_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Client> {
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = $1, tax_id = $2, email = $3, phone = $4, address = $5,
                birth_date = $6, updated_at = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(tax_id)
        .bind(data.email.trim())
        .bind(data.phone.trim())
        .bind(&data.address)
        .bind(data.birth_date)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))
    }

    /// Delete client; its rentals go with it through the foreign key
    pub async fn clients_delete(conn: &mut PgConnection, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Client {} not found", id)));
        }
        Ok(())
    }
}
