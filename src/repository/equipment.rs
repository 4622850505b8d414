//! Equipment domain methods on Repository

use rust_decimal::Decimal;
use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::equipment::{Equipment, EquipmentForm, EquipmentStatus},
};

impl Repository {
    /// List all equipment
    pub async fn equipment_list(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get equipment by ID
    pub async fn equipment_get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Get and lock equipment for the rest of the transaction
    pub async fn equipment_lock(conn: &mut PgConnection, id: i32) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    /// Create equipment
    pub async fn equipment_create(
        &self,
        name: &str,
        status: EquipmentStatus,
        daily_rate: Decimal,
        photo: Option<&str>,
    ) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (name, status, daily_rate, photo)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(status)
        .bind(daily_rate)
        .bind(photo)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the fields present in `data`, and the photo path when `photo` is set
    pub async fn equipment_update(
        &self,
        id: i32,
        data: &EquipmentForm,
        photo: Option<&str>,
    ) -> AppResult<Equipment> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.name, "name");
        add_field!(data.status, "status");
        add_field!(data.daily_rate, "daily_rate");
        add_field!(photo, "photo");

        if sets.is_empty() {
            return self.equipment_get_by_id(id).await;
        }

        let query = format!(
            "UPDATE equipment SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Equipment>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name.as_deref().map(str::trim));
        bind_field!(data.status);
        bind_field!(data.daily_rate);
        bind_field!(photo);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Set equipment status, within a transaction
    pub async fn equipment_set_status(
        conn: &mut PgConnection,
        id: i32,
        status: EquipmentStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE equipment SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Delete equipment and its rentals, returning the deleted row
    pub async fn equipment_delete(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("DELETE FROM equipment WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Number of equipment items per status
    pub async fn equipment_count_by_status(&self) -> AppResult<Vec<(EquipmentStatus, i64)>> {
        let rows: Vec<(EquipmentStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*)::bigint FROM equipment GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
