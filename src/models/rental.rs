//! Rental model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::datetime::InputDateTime;
use super::equipment::validate_amount;
use crate::lifecycle::billing;

/// Rental status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "rental_status", rename_all = "snake_case")]
pub enum RentalStatus {
    #[default]
    #[serde(rename = "aberto")]
    Open,
    #[serde(rename = "fechado")]
    Closed,
    #[serde(rename = "cancelado")]
    Cancelled,
    #[serde(rename = "em_andamento")]
    InProgress,
}

impl RentalStatus {
    /// Open and in-progress rentals hold their equipment
    pub fn is_active(&self) -> bool {
        matches!(self, RentalStatus::Open | RentalStatus::InProgress)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RentalStatus::Open => "Aberto",
            RentalStatus::Closed => "Fechado",
            RentalStatus::Cancelled => "Cancelado",
            RentalStatus::InProgress => "Em Andamento",
        }
    }
}

/// Rental row
#[derive(Debug, Clone, FromRow)]
pub struct Rental {
    pub id: i32,
    pub client_id: i32,
    pub equipment_id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub total: Option<Decimal>,
    pub status: RentalStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    /// Elapsed hours, `None` while the rental has no end
    pub fn duration_hours(&self) -> Option<Decimal> {
        self.end_date
            .map(|end| billing::elapsed_hours(self.start_date, end))
    }
}

/// Rental joined with the names of its client and equipment
#[derive(Debug, Clone, FromRow)]
pub struct RentalDetails {
    #[sqlx(flatten)]
    pub rental: Rental,
    pub client_name: String,
    pub equipment_name: String,
}

/// Reference to a related record
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RelatedRef {
    pub id: i32,
    #[serde(rename = "nome")]
    pub name: String,
}

/// Rental as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RentalResponse {
    pub id: i32,
    #[serde(rename = "cliente")]
    pub client: RelatedRef,
    #[serde(rename = "equipamento")]
    pub equipment: RelatedRef,
    #[serde(rename = "data_inicio")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "data_fim")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "valor_total")]
    #[schema(value_type = Option<String>)]
    pub total: Option<Decimal>,
    pub status: RentalStatus,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
    #[serde(rename = "duracao_horas")]
    #[schema(value_type = Option<String>)]
    pub duration_hours: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RentalDetails> for RentalResponse {
    fn from(details: RentalDetails) -> Self {
        let rental = details.rental;
        Self {
            id: rental.id,
            client: RelatedRef {
                id: rental.client_id,
                name: details.client_name,
            },
            equipment: RelatedRef {
                id: rental.equipment_id,
                name: details.equipment_name,
            },
            duration_hours: rental.duration_hours().map(|h| h.round_dp(2)),
            start_date: rental.start_date,
            end_date: rental.end_date,
            total: rental.total,
            status: rental.status,
            notes: rental.notes,
            created_at: rental.created_at,
            updated_at: rental.updated_at,
        }
    }
}

/// Create rental request
#[serde_as]
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateRental {
    /// Client ID
    #[serde(rename = "cliente")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub client_id: i32,
    /// Equipment ID
    #[serde(rename = "equipamento")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub equipment_id: i32,
    #[serde(rename = "data_inicio")]
    #[schema(value_type = String, format = DateTime)]
    pub start_date: InputDateTime,
    #[serde(rename = "data_fim", default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_date: Option<InputDateTime>,
    /// Explicit charge; computed from the hourly rate when absent
    #[serde(rename = "valor_total", default)]
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = Option<String>)]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub status: Option<RentalStatus>,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
}

/// Update rental request
///
/// Absent fields are left alone. For `data_fim`, `valor_total` and
/// `observacoes` an explicit `null` clears the stored value.
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_update_amount"))]
pub struct UpdateRental {
    #[serde(rename = "cliente", default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub client_id: Option<i32>,
    #[serde(rename = "equipamento", default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub equipment_id: Option<i32>,
    #[serde(rename = "data_inicio", default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_date: Option<InputDateTime>,
    #[serde(rename = "data_fim", default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_date: Option<Option<InputDateTime>>,
    #[serde(rename = "valor_total", default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub total: Option<Option<Decimal>>,
    #[serde(default)]
    pub status: Option<RentalStatus>,
    #[serde(rename = "observacoes", default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

/// Close rental request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CloseRental {
    /// End timestamp; defaults to now when the rental has none
    #[serde(rename = "data_fim", default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_date: Option<InputDateTime>,
    /// Whether the close was triggered by the end date passing
    #[serde(default)]
    pub auto_closed: bool,
    /// Accepted for front end compatibility; only `fechado` is allowed
    #[serde(default)]
    #[validate(custom(function = "validate_close_status"))]
    pub status: Option<RentalStatus>,
}

fn validate_update_amount(update: &UpdateRental) -> Result<(), ValidationError> {
    match update.total {
        Some(Some(ref amount)) => validate_amount(amount),
        _ => Ok(()),
    }
}

fn validate_close_status(status: &RentalStatus) -> Result<(), ValidationError> {
    if *status == RentalStatus::Closed {
        Ok(())
    } else {
        let mut err = ValidationError::new("status");
        err.message = Some("closing a rental only accepts status 'fechado'".into());
        Err(err)
    }
}
