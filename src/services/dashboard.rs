//! Dashboard statistics

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::clock::Clock;
use crate::{
    error::{AppError, AppResult},
    models::{EquipmentStatus, RentalDetails},
    repository::Repository,
};

const RECENT_RENTALS: i64 = 5;

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentRental {
    pub id: i32,
    pub cliente_nome: String,
    pub equipamento_nome: String,
    /// `dd/mm/YYYY HH:MM` in the display offset
    pub data_inicio: String,
    pub status: String,
    /// Charge, or `N/A` when not computed yet
    pub valor_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub active_rentals: i64,
    /// Charges of rentals closed this month, as a decimal string
    pub monthly_revenue: String,
    pub available_equipment: i64,
    pub recent_rentals: Vec<RecentRental>,
    pub equipment_stats: BTreeMap<String, StatusCount>,
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    display_offset: FixedOffset,
}

impl DashboardService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>, display_offset: FixedOffset) -> Self {
        Self {
            repository,
            clock,
            display_offset,
        }
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let (from, until) = month_window(self.clock.now(), self.display_offset)?;

        let active_rentals = self.repository.dashboard_count_active_rentals().await?;
        let monthly_revenue = self.repository.dashboard_closed_revenue(from, until).await?;
        let by_status = self.repository.equipment_count_by_status().await?;
        let recent = self.repository.rentals_recent(RECENT_RENTALS).await?;

        let equipment_stats = equipment_stats(&by_status);
        let available_equipment = equipment_stats
            .get(EquipmentStatus::Available.as_str())
            .map_or(0, |s| s.count);

        Ok(DashboardStats {
            active_rentals,
            monthly_revenue: monthly_revenue.to_string(),
            available_equipment,
            recent_rentals: recent
                .into_iter()
                .map(|r| recent_rental(r, self.display_offset))
                .collect(),
            equipment_stats,
        })
    }
}

/// Bounds of the calendar month containing `now`, in the display offset
pub fn month_window(
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let local = now.with_timezone(&offset);
    let (year, month) = (local.year(), local.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };

    let start_of = |y: i32, m: u32| -> AppResult<DateTime<Utc>> {
        let midnight = NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| AppError::Internal(format!("Invalid month {}-{}", y, m)))?;
        offset
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| AppError::Internal(format!("Ambiguous month start {}-{}", y, m)))
    };

    Ok((start_of(year, month)?, start_of(next_year, next_month)?))
}

fn equipment_stats(counts: &[(EquipmentStatus, i64)]) -> BTreeMap<String, StatusCount> {
    EquipmentStatus::ALL
        .into_iter()
        .map(|status| {
            let count = counts
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, c)| *c);
            (
                status.as_str().to_string(),
                StatusCount {
                    label: status.label().to_string(),
                    count,
                },
            )
        })
        .collect()
}

fn recent_rental(details: RentalDetails, offset: FixedOffset) -> RecentRental {
    let rental = details.rental;
    RecentRental {
        id: rental.id,
        cliente_nome: details.client_name,
        equipamento_nome: details.equipment_name,
        data_inicio: rental
            .start_date
            .with_timezone(&offset)
            .format("%d/%m/%Y %H:%M")
            .to_string(),
        status: rental.status.label().to_string(),
        valor_total: rental
            .total
            .map_or_else(|| "N/A".to_string(), |t| t.to_string()),
    }
}
