//! Rental domain methods on Repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    lifecycle::ClosePlan,
    models::rental::{Rental, RentalDetails, RentalStatus},
};

const DETAILS_SELECT: &str = r#"
    SELECT r.*, c.name AS client_name, e.name AS equipment_name
    FROM rentals r
    JOIN clients c ON c.id = r.client_id
    JOIN equipment e ON e.id = r.equipment_id
"#;

/// Every stored column of a rental that a create or update writes
#[derive(Debug, Clone)]
pub struct RentalWrite {
    pub client_id: i32,
    pub equipment_id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub total: Option<Decimal>,
    pub status: RentalStatus,
    pub notes: Option<String>,
}

/// An expired rental together with the rate of its equipment
#[derive(Debug, Clone, FromRow)]
pub struct ExpiredRental {
    #[sqlx(flatten)]
    pub rental: Rental,
    pub daily_rate: Decimal,
}

impl Repository {
    /// List rentals, newest first
    pub async fn rentals_list(&self) -> AppResult<Vec<RentalDetails>> {
        let query = format!("{} ORDER BY r.created_at DESC, r.id DESC", DETAILS_SELECT);
        let rows = sqlx::query_as::<_, RentalDetails>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// The `limit` most recently created rentals
    pub async fn rentals_recent(&self, limit: i64) -> AppResult<Vec<RentalDetails>> {
        let query = format!("{} ORDER BY r.created_at DESC, r.id DESC LIMIT $1", DETAILS_SELECT);
        let rows = sqlx::query_as::<_, RentalDetails>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get rental with client and equipment names
    pub async fn rentals_get_by_id(&self, id: i32) -> AppResult<RentalDetails> {
        let query = format!("{} WHERE r.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, RentalDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rental {} not found", id)))
    }

    /// Get and lock a rental for the rest of the transaction
    pub async fn rentals_lock(conn: &mut PgConnection, id: i32) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rental {} not found", id)))
    }

    /// Insert a rental
    pub async fn rentals_create(
        conn: &mut PgConnection,
        data: &RentalWrite,
        now: DateTime<Utc>,
    ) -> AppResult<Rental> {
        let row = sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals
                (client_id, equipment_id, start_date, end_date, total, status, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(data.client_id)
        .bind(data.equipment_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.total)
        .bind(data.status)
        .bind(&data.notes)
        .bind(now)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// Overwrite every writable column of a rental
    pub async fn rentals_update(
        conn: &mut PgConnection,
        id: i32,
        data: &RentalWrite,
        now: DateTime<Utc>,
    ) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET client_id = $1, equipment_id = $2, start_date = $3, end_date = $4,
                total = $5, status = $6, notes = $7, updated_at = $8
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(data.client_id)
        .bind(data.equipment_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.total)
        .bind(data.status)
        .bind(&data.notes)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Rental {} not found", id)))
    }

    /// Write the outcome of a close
    pub async fn rentals_close(
        conn: &mut PgConnection,
        id: i32,
        plan: &ClosePlan,
        now: DateTime<Utc>,
    ) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET status = $1, end_date = $2, total = $3, notes = $4, updated_at = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(plan.status)
        .bind(plan.end_date)
        .bind(plan.total)
        .bind(&plan.notes)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Rental {} not found", id)))
    }

    /// Delete a rental
    pub async fn rentals_delete(conn: &mut PgConnection, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM rentals WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Rental {} not found", id)));
        }
        Ok(())
    }

    /// Equipment held by the active rentals of a client
    pub async fn rentals_active_equipment_of_client(
        conn: &mut PgConnection,
        client_id: i32,
    ) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT equipment_id FROM rentals
            WHERE client_id = $1 AND status IN ('open', 'in_progress')
            ORDER BY equipment_id
            "#,
        )
        .bind(client_id)
        .fetch_all(conn)
        .await?;
        Ok(ids)
    }

    /// Number of active rentals on an equipment item, optionally ignoring one rental
    pub async fn rentals_count_active_for_equipment(
        conn: &mut PgConnection,
        equipment_id: i32,
        excluding: Option<i32>,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)::bigint FROM rentals
            WHERE equipment_id = $1
              AND status IN ('open', 'in_progress')
              AND ($2::int IS NULL OR id <> $2)
            "#,
        )
        .bind(equipment_id)
        .bind(excluding)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    /// Lock every active rental whose end date is before `now`
    pub async fn rentals_lock_expired(
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ExpiredRental>> {
        let rows = sqlx::query_as::<_, ExpiredRental>(
            r#"
            SELECT r.*, e.daily_rate
            FROM rentals r
            JOIN equipment e ON e.id = r.equipment_id
            WHERE r.status IN ('open', 'in_progress')
              AND r.end_date IS NOT NULL
              AND r.end_date < $1
            ORDER BY r.id
            FOR UPDATE OF r
            "#,
        )
        .bind(now)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }
}
