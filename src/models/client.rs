//! Client (renter) model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Client record
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Client {
    pub id: i32,
    #[serde(rename = "nome")]
    pub name: String,
    /// CPF in `000.000.000-00` form
    #[serde(rename = "cpf")]
    pub tax_id: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(rename = "data_nascimento")]
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or replace client request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ClientRequest {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    #[serde(rename = "cpf")]
    #[validate(custom(function = "validate_tax_id"))]
    pub tax_id: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(rename = "telefone")]
    #[validate(length(min = 1, max = 15, message = "must be between 1 and 15 characters"))]
    pub phone: String,
    #[serde(rename = "endereco")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub address: String,
    /// Birth date (YYYY-MM-DD)
    #[serde(rename = "data_nascimento")]
    pub birth_date: NaiveDate,
}

/// Normalize a CPF to `000.000.000-00`, ignoring any punctuation in the input
pub fn normalize_tax_id(raw: &str) -> Option<String> {
    if raw.chars().any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '-' | ' '))) {
        return None;
    }
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 11 {
        return None;
    }
    Some(format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    ))
}

fn validate_tax_id(raw: &str) -> Result<(), ValidationError> {
    match normalize_tax_id(raw) {
        Some(_) => Ok(()),
        None => {
            let mut err = ValidationError::new("cpf");
            err.message = Some("must contain exactly 11 digits".into());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> serde_json::Value {
        json!({
            "nome": "Maria Souza",
            "cpf": "123.456.789-09",
            "email": "maria@example.com",
            "telefone": "11999990000",
            "endereco": "Rua A, 10",
            "data_nascimento": "1990-05-17"
        })
    }

    #[test]
    fn test_normalize_tax_id() {
        assert_eq!(normalize_tax_id("12345678909").as_deref(), Some("123.456.789-09"));
        assert_eq!(normalize_tax_id("123.456.789-09").as_deref(), Some("123.456.789-09"));
        assert_eq!(normalize_tax_id("123 456 789 09").as_deref(), Some("123.456.789-09"));
        assert!(normalize_tax_id("1234567890").is_none());
        assert!(normalize_tax_id("123.456.789-0a").is_none());
    }

    #[test]
    fn test_valid_request() {
        let req: ClientRequest = serde_json::from_value(request()).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.birth_date, NaiveDate::from_ymd_opt(1990, 5, 17).unwrap());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut body = request();
        body["apelido"] = json!("Mari");
        assert!(serde_json::from_value::<ClientRequest>(body).is_err());
    }

    #[test]
    fn test_bad_birth_date_is_rejected() {
        let mut body = request();
        body["data_nascimento"] = json!("17/05/1990");
        assert!(serde_json::from_value::<ClientRequest>(body).is_err());
    }

    #[test]
    fn test_field_errors() {
        let mut body = request();
        body["cpf"] = json!("123");
        body["email"] = json!("not-an-email");
        let req: ClientRequest = serde_json::from_value(body).unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let client = Client {
            id: 1,
            name: "Maria".into(),
            tax_id: "123.456.789-09".into(),
            email: "maria@example.com".into(),
            phone: "1199".into(),
            address: "Rua A".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            created_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            updated_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };
        let value = serde_json::to_value(&client).unwrap();
        assert_eq!(value["nome"], "Maria");
        assert_eq!(value["cpf"], "123.456.789-09");
        assert_eq!(value["data_nascimento"], "1990-05-17");
        assert_eq!(value["created_at"], "1970-01-01T00:00:00Z");
    }
}
