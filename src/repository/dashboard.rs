//! Dashboard aggregates

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::Repository;
use crate::error::AppResult;

impl Repository {
    /// Number of open or in-progress rentals
    pub async fn dashboard_count_active_rentals(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::bigint FROM rentals WHERE status IN ('open', 'in_progress')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Sum of the charges of closed rentals last updated in `[from, until)`
    pub async fn dashboard_closed_revenue(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total), 0)
            FROM rentals
            WHERE status = 'closed'
              AND total IS NOT NULL
              AND updated_at >= $1 AND updated_at < $2
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
