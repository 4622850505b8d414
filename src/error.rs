//! Error types for the rental server

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable error kinds exposed alongside the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotAuthenticated,
    NotAuthorized,
    NotFound,
    BadValue,
    Duplicate,
    Conflict,
    DbFailure,
    Failure,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid fields: {0}")]
    InvalidFields(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
///
/// `error` carries the human readable message, which is what the admin
/// front end displays.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

/// Flatten validator errors into `field -> [messages]`
pub fn field_messages(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl AppError {
    fn from_database(e: &sqlx::Error) -> (StatusCode, ErrorCode, String) {
        match e {
            sqlx::Error::RowNotFound => (
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                "Record not found".to_string(),
            ),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let message = match db.constraint() {
                    Some("clients_tax_id_key") => "A client with this CPF already exists".to_string(),
                    Some(name) => format!("Duplicate value violates {}", name),
                    None => "Duplicate value".to_string(),
                };
                (StatusCode::BAD_REQUEST, ErrorCode::Duplicate, message)
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => (
                StatusCode::BAD_REQUEST,
                ErrorCode::BadValue,
                "Referenced record does not exist".to_string(),
            ),
            sqlx::Error::Database(db) if db.is_check_violation() => (
                StatusCode::BAD_REQUEST,
                ErrorCode::BadValue,
                db.message().to_string(),
            ),
            _ => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthenticated, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::InvalidFields(errors) => {
                let by_field = field_messages(errors);
                let message = by_field
                    .iter()
                    .map(|(field, msgs)| format!("{}: {}", field, msgs.join(", ")))
                    .collect::<Vec<_>>()
                    .join("; ");
                fields = Some(by_field);
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, message)
            }
            AppError::Database(e) => Self::from_database(e),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Conflict, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code,
            fields,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
