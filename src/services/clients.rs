//! Client management service

use std::sync::Arc;

use validator::Validate;

use super::{clock::Clock, rentals::apply_effects};
use crate::{
    error::{AppError, AppResult},
    lifecycle::StatusSyncPolicy,
    models::client::{normalize_tax_id, Client, ClientRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct ClientsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    policy: StatusSyncPolicy,
}

impl ClientsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>, policy: StatusSyncPolicy) -> Self {
        Self {
            repository,
            clock,
            policy,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Client>> {
        self.repository.clients_list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Client> {
        self.repository.clients_get_by_id(id).await
    }

    pub async fn create(&self, data: ClientRequest) -> AppResult<Client> {
        let tax_id = Self::checked_tax_id(&data)?;
        let client = self
            .repository
            .clients_create(&data, &tax_id, self.clock.now())
            .await?;
        tracing::info!("Created client {} ({})", client.id, client.tax_id);
        Ok(client)
    }

    /// Replace a client
    pub async fn update(&self, id: i32, data: ClientRequest) -> AppResult<Client> {
        let tax_id = Self::checked_tax_id(&data)?;
        self.repository
            .clients_update(id, &data, &tax_id, self.clock.now())
            .await
    }

    /// Delete a client together with its rentals
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        let held = Repository::rentals_active_equipment_of_client(&mut tx, id).await?;
        Repository::clients_delete(&mut tx, id).await?;
        apply_effects(&mut tx, self.policy.on_cascade_delete(&held)).await?;
        tx.commit().await?;

        tracing::info!(
            "Deleted client {} ({} equipment item(s) released)",
            id,
            held.len()
        );
        Ok(())
    }

    fn checked_tax_id(data: &ClientRequest) -> AppResult<String> {
        data.validate()?;
        normalize_tax_id(&data.tax_id)
            .ok_or_else(|| AppError::Validation(format!("cpf: invalid value '{}'", data.tax_id)))
    }
}
