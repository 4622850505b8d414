//! Business logic services

pub mod auth;
pub mod clients;
pub mod clock;
pub mod dashboard;
pub mod equipment;
pub mod rentals;
pub mod storage;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::datetime::offset_from_hours,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub clients: clients::ClientsService,
    pub equipment: equipment::EquipmentService,
    pub rentals: rentals::RentalsService,
    pub dashboard: dashboard::DashboardService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and time source
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        clock: Arc<dyn clock::Clock>,
    ) -> AppResult<Self> {
        let display_offset = offset_from_hours(config.server.display_utc_offset_hours)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Invalid display offset: {} hours",
                    config.server.display_utc_offset_hours
                ))
            })?;
        let policy = config.rentals.equipment_status_sync;

        Ok(Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone(), clock.clone()),
            clients: clients::ClientsService::new(repository.clone(), clock.clone(), policy),
            equipment: equipment::EquipmentService::new(
                repository.clone(),
                storage::MediaStorage::new(&config.storage),
            ),
            rentals: rentals::RentalsService::new(
                repository.clone(),
                clock.clone(),
                policy,
                config.rentals.allow_overlapping,
                display_offset,
            ),
            dashboard: dashboard::DashboardService::new(repository.clone(), clock, display_offset),
            repository,
        })
    }

    /// Whether the database answers
    pub async fn ready(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
