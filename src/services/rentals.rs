//! Rental management service

use std::sync::Arc;

use chrono::FixedOffset;
use sqlx::PgConnection;
use validator::Validate;

use super::clock::Clock;
use crate::{
    error::{AppError, AppResult},
    lifecycle::{
        billing, closing,
        sync::{claims_equipment, derive_status},
        CloseReason, EquipmentEffect, RentalLink, StatusSyncPolicy,
    },
    models::{
        equipment::Equipment,
        rental::{CloseRental, CreateRental, RentalResponse, UpdateRental},
        InputDateTime,
    },
    repository::{rentals::RentalWrite, Repository},
};

/// Write equipment status changes inside the caller's transaction
pub(crate) async fn apply_effects(
    conn: &mut PgConnection,
    effects: Vec<EquipmentEffect>,
) -> AppResult<()> {
    for effect in effects {
        match effect {
            EquipmentEffect::Set { equipment_id, status } => {
                Repository::equipment_set_status(&mut *conn, equipment_id, status).await?;
            }
            EquipmentEffect::Recompute { equipment_id } => {
                let Some(equipment) = Repository::equipment_lock(&mut *conn, equipment_id).await?
                else {
                    continue;
                };
                let active =
                    Repository::rentals_count_active_for_equipment(&mut *conn, equipment_id, None)
                        .await?;
                let status = derive_status(equipment.status, active);
                if status != equipment.status {
                    Repository::equipment_set_status(&mut *conn, equipment_id, status).await?;
                }
            }
        }
        tracing::debug!("Applied equipment effect {:?}", effect);
    }
    Ok(())
}

#[derive(Clone)]
pub struct RentalsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    policy: StatusSyncPolicy,
    allow_overlapping: bool,
    local_offset: FixedOffset,
}

impl RentalsService {
    pub fn new(
        repository: Repository,
        clock: Arc<dyn Clock>,
        policy: StatusSyncPolicy,
        allow_overlapping: bool,
        local_offset: FixedOffset,
    ) -> Self {
        Self {
            repository,
            clock,
            policy,
            allow_overlapping,
            local_offset,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<RentalResponse>> {
        let rows = self.repository.rentals_list().await?;
        Ok(rows.into_iter().map(RentalResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<RentalResponse> {
        Ok(self.repository.rentals_get_by_id(id).await?.into())
    }

    /// Create a rental; an active one marks its equipment rented
    pub async fn create(&self, data: CreateRental) -> AppResult<RentalResponse> {
        data.validate()?;

        let start_date = self.resolve(&data.start_date)?;
        let end_date = data.end_date.as_ref().map(|d| self.resolve(d)).transpose()?;
        billing::check_window(start_date, end_date)?;
        let status = data.status.unwrap_or_default();

        let mut tx = self.repository.begin().await?;

        if !Repository::clients_exists(&mut tx, data.client_id).await? {
            return Err(AppError::NotFound(format!("Client {} not found", data.client_id)));
        }
        let equipment = self.lock_equipment(&mut tx, data.equipment_id).await?;

        let link = RentalLink::new(equipment.id, status);
        if claims_equipment(None, link) {
            self.check_overlap(&mut tx, &equipment, None).await?;
        }

        let write = RentalWrite {
            client_id: data.client_id,
            equipment_id: equipment.id,
            start_date,
            end_date,
            total: billing::check_total(billing::settle(
                data.total,
                equipment.daily_rate,
                start_date,
                end_date,
            ))?,
            status,
            notes: data.notes,
        };
        let rental = Repository::rentals_create(&mut tx, &write, self.clock.now()).await?;
        apply_effects(&mut tx, self.policy.on_create(link)).await?;
        tx.commit().await?;

        tracing::info!(
            "Created rental {} (client {}, equipment {}, status {:?})",
            rental.id,
            rental.client_id,
            rental.equipment_id,
            rental.status
        );
        self.get_by_id(rental.id).await
    }

    /// Update the fields present in `data`
    pub async fn update(&self, id: i32, data: UpdateRental) -> AppResult<RentalResponse> {
        data.validate()?;

        let mut tx = self.repository.begin().await?;
        let before = Repository::rentals_lock(&mut tx, id).await?;

        let start_date = match &data.start_date {
            Some(start) => self.resolve(start)?,
            None => before.start_date,
        };
        let end_date = match &data.end_date {
            Some(end) => end.as_ref().map(|d| self.resolve(d)).transpose()?,
            None => before.end_date,
        };
        billing::check_window(start_date, end_date)?;

        let client_id = data.client_id.unwrap_or(before.client_id);
        if client_id != before.client_id && !Repository::clients_exists(&mut tx, client_id).await? {
            return Err(AppError::NotFound(format!("Client {} not found", client_id)));
        }
        let equipment = self
            .lock_equipment(&mut tx, data.equipment_id.unwrap_or(before.equipment_id))
            .await?;

        let status = data.status.unwrap_or(before.status);
        let before_link = RentalLink::new(before.equipment_id, before.status);
        let after_link = RentalLink::new(equipment.id, status);
        if claims_equipment(Some(before_link), after_link) {
            self.check_overlap(&mut tx, &equipment, Some(id)).await?;
        }

        let total = data.total.unwrap_or(before.total);
        let write = RentalWrite {
            client_id,
            equipment_id: equipment.id,
            start_date,
            end_date,
            total: billing::check_total(billing::settle(
                total,
                equipment.daily_rate,
                start_date,
                end_date,
            ))?,
            status,
            notes: data.notes.unwrap_or(before.notes),
        };
        Repository::rentals_update(&mut tx, id, &write, self.clock.now()).await?;
        apply_effects(&mut tx, self.policy.on_update(before_link, after_link)).await?;
        tx.commit().await?;

        if before_link != after_link {
            tracing::info!(
                "Rental {} moved from {:?} to {:?}",
                id,
                before_link,
                after_link
            );
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        let rental = Repository::rentals_lock(&mut tx, id).await?;
        Repository::rentals_delete(&mut tx, id).await?;
        let link = RentalLink::new(rental.equipment_id, rental.status);
        apply_effects(&mut tx, self.policy.on_delete(link)).await?;
        tx.commit().await?;

        tracing::info!("Deleted rental {} (status {:?})", id, rental.status);
        Ok(())
    }

    /// Force a rental into the closed state
    pub async fn close(&self, id: i32, data: CloseRental) -> AppResult<RentalResponse> {
        data.validate()?;
        let now = self.clock.now();

        let mut tx = self.repository.begin().await?;
        let rental = Repository::rentals_lock(&mut tx, id).await?;
        let equipment = self.lock_equipment(&mut tx, rental.equipment_id).await?;

        let reason = if data.auto_closed {
            CloseReason::Flagged
        } else {
            CloseReason::Manual
        };
        let requested_end = data.end_date.as_ref().map(|d| self.resolve(d)).transpose()?;
        let plan = closing::plan_close(&rental, equipment.daily_rate, requested_end, reason, now)?;

        let closed = Repository::rentals_close(&mut tx, id, &plan, now).await?;
        let link = RentalLink::new(closed.equipment_id, closed.status);
        apply_effects(&mut tx, self.policy.on_close(link)).await?;
        tx.commit().await?;

        tracing::info!(
            "Closed rental {} ({:?}, total {:?})",
            id,
            reason,
            closed.total
        );
        self.get_by_id(id).await
    }

    /// Close every active rental whose end date has passed, returning how many were closed
    pub async fn close_expired(&self) -> AppResult<u64> {
        let now = self.clock.now();
        let mut tx = self.repository.begin().await?;
        let expired = Repository::rentals_lock_expired(&mut tx, now).await?;

        let mut closed_count = 0;
        for row in expired {
            let plan = match closing::plan_expiry(&row.rental, row.daily_rate, now) {
                Ok(Some(plan)) => plan,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Expiry sweep left rental {} open: {}", row.rental.id, e);
                    continue;
                }
            };
            let closed = Repository::rentals_close(&mut tx, row.rental.id, &plan, now).await?;
            let link = RentalLink::new(closed.equipment_id, closed.status);
            apply_effects(&mut tx, self.policy.on_close(link)).await?;
            tracing::debug!("Auto-closed rental {} ended at {}", closed.id, plan.end_date);
            closed_count += 1;
        }
        tx.commit().await?;

        if closed_count > 0 {
            tracing::info!("Expiry sweep closed {} rental(s)", closed_count);
        }
        Ok(closed_count)
    }

    fn resolve(&self, input: &InputDateTime) -> AppResult<chrono::DateTime<chrono::Utc>> {
        input.resolve(self.local_offset)
    }

    async fn lock_equipment(&self, conn: &mut PgConnection, id: i32) -> AppResult<Equipment> {
        Repository::equipment_lock(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Refuse or report a second active rental on the same equipment
    async fn check_overlap(
        &self,
        conn: &mut PgConnection,
        equipment: &Equipment,
        excluding: Option<i32>,
    ) -> AppResult<()> {
        let active =
            Repository::rentals_count_active_for_equipment(conn, equipment.id, excluding).await?;
        if active == 0 {
            return Ok(());
        }
        if !self.allow_overlapping {
            return Err(AppError::Conflict(format!(
                "Equipment {} already has an active rental",
                equipment.id
            )));
        }
        tracing::warn!(
            "Equipment {} ({}) now has {} other active rental(s)",
            equipment.id,
            equipment.name,
            active
        );
        Ok(())
    }
}
