//! Equipment service

use validator::Validate;

use super::storage::MediaStorage;
use crate::{
    error::{AppError, AppResult},
    models::equipment::{Equipment, EquipmentForm, EquipmentStatus},
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
    storage: MediaStorage,
}

impl EquipmentService {
    pub fn new(repository: Repository, storage: MediaStorage) -> Self {
        Self { repository, storage }
    }

    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        self.repository.equipment_list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        self.repository.equipment_get_by_id(id).await
    }

    /// Create equipment; name and daily rate are required
    pub async fn create(&self, data: EquipmentForm) -> AppResult<Equipment> {
        data.validate()?;
        let name = data
            .name
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| AppError::Validation("nome: this field is required".to_string()))?;
        let daily_rate = data
            .daily_rate
            .ok_or_else(|| AppError::Validation("valor_diario: this field is required".to_string()))?;
        let status = data.status.unwrap_or(EquipmentStatus::Available);

        let photo = match &data.photo {
            Some(upload) => Some(self.storage.save_photo(upload).await?),
            None => None,
        };

        match self
            .repository
            .equipment_create(name, status, daily_rate, photo.as_deref())
            .await
        {
            Ok(equipment) => {
                tracing::info!("Created equipment {} ({})", equipment.id, equipment.name);
                Ok(equipment)
            }
            Err(e) => {
                if let Some(path) = &photo {
                    self.storage.remove(path).await;
                }
                Err(e)
            }
        }
    }

    /// Update the fields present in `data`; a new photo replaces the stored one
    pub async fn update(&self, id: i32, data: EquipmentForm) -> AppResult<Equipment> {
        data.validate()?;
        let previous = self.repository.equipment_get_by_id(id).await?;

        let photo = match &data.photo {
            Some(upload) => Some(self.storage.save_photo(upload).await?),
            None => None,
        };

        match self
            .repository
            .equipment_update(id, &data, photo.as_deref())
            .await
        {
            Ok(equipment) => {
                if let (Some(_), Some(old)) = (&photo, &previous.photo) {
                    self.storage.remove(old).await;
                }
                Ok(equipment)
            }
            Err(e) => {
                if let Some(path) = &photo {
                    self.storage.remove(path).await;
                }
                Err(e)
            }
        }
    }

    /// Delete equipment, its rentals and its photo
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let equipment = self.repository.equipment_delete(id).await?;
        if let Some(photo) = &equipment.photo {
            self.storage.remove(photo).await;
        }
        tracing::info!("Deleted equipment {} ({})", equipment.id, equipment.name);
        Ok(())
    }

    /// Read a stored media file
    pub async fn media(&self, path: &str) -> AppResult<Option<Vec<u8>>> {
        self.storage.read(path).await
    }
}
