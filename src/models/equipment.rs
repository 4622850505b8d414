//! Equipment model

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Largest daily rate a `NUMERIC(10,2)` column holds
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Equipment availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "equipment_status", rename_all = "snake_case")]
pub enum EquipmentStatus {
    #[serde(rename = "disponivel")]
    Available,
    #[serde(rename = "alugado")]
    Rented,
    #[serde(rename = "manutencao")]
    Maintenance,
    #[serde(rename = "indisponivel")]
    Unavailable,
}

impl EquipmentStatus {
    pub const ALL: [EquipmentStatus; 4] = [
        EquipmentStatus::Available,
        EquipmentStatus::Rented,
        EquipmentStatus::Maintenance,
        EquipmentStatus::Unavailable,
    ];

    /// Value used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "disponivel",
            EquipmentStatus::Rented => "alugado",
            EquipmentStatus::Maintenance => "manutencao",
            EquipmentStatus::Unavailable => "indisponivel",
        }
    }

    /// Display label shown by the admin front end
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "Disponível",
            EquipmentStatus::Rented => "Alugado",
            EquipmentStatus::Maintenance => "Em Manutenção",
            EquipmentStatus::Unavailable => "Indisponível",
        }
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid equipment status: {}", s))
    }
}

/// Equipment record
#[derive(Debug, Clone, FromRow)]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    pub status: EquipmentStatus,
    pub daily_rate: Decimal,
    /// Photo path relative to the media root
    pub photo: Option<String>,
}

impl Equipment {
    /// Hourly rate, derived from the daily rate and never stored
    pub fn hourly_rate(&self) -> Decimal {
        self.daily_rate / Decimal::from(24)
    }
}

/// Equipment as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EquipmentResponse {
    pub id: i32,
    #[serde(rename = "nome")]
    pub name: String,
    pub status: EquipmentStatus,
    #[serde(rename = "valor_diario")]
    #[schema(value_type = String)]
    pub daily_rate: Decimal,
    #[serde(rename = "valor_por_hora")]
    #[schema(value_type = String)]
    pub hourly_rate: Decimal,
    /// Photo URL, served to authenticated staff only
    #[serde(rename = "foto")]
    pub photo_url: Option<String>,
}

impl EquipmentResponse {
    pub fn new(equipment: Equipment, media_url: &str) -> Self {
        let hourly_rate = equipment.hourly_rate();
        Self {
            id: equipment.id,
            photo_url: equipment
                .photo
                .map(|path| format!("{}/{}", media_url.trim_end_matches('/'), path)),
            name: equipment.name,
            status: equipment.status,
            daily_rate: equipment.daily_rate,
            hourly_rate,
        }
    }
}

/// JSON body for creating or replacing equipment
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct EquipmentJson {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
    pub status: Option<EquipmentStatus>,
    #[serde(rename = "valor_diario")]
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = String)]
    pub daily_rate: Decimal,
}

/// Uploaded photo, held in memory until written to the media root
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Equipment changes from either a JSON body or a multipart form
///
/// Every field is optional because multipart updates only carry what the
/// form sent; creation checks the required ones.
#[derive(Debug, Default, Validate)]
pub struct EquipmentForm {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: Option<String>,
    pub status: Option<EquipmentStatus>,
    #[validate(custom(function = "validate_amount"))]
    pub daily_rate: Option<Decimal>,
    pub photo: Option<PhotoUpload>,
}

impl From<EquipmentJson> for EquipmentForm {
    fn from(json: EquipmentJson) -> Self {
        Self {
            name: Some(json.name),
            status: json.status,
            daily_rate: Some(json.daily_rate),
            photo: None,
        }
    }
}

/// Amounts must fit a non-negative `NUMERIC(10,2)`
pub fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    let message = if amount.is_sign_negative() && !amount.is_zero() {
        Some("must not be negative")
    } else if amount.normalize().scale() > 2 {
        Some("must have at most 2 decimal places")
    } else if *amount > MAX_AMOUNT {
        Some("is too large")
    } else {
        None
    };

    match message {
        None => Ok(()),
        Some(message) => {
            let mut err = ValidationError::new("amount");
            err.message = Some(message.into());
            Err(err)
        }
    }
}
