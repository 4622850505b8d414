//! Request body extractors
//!
//! Every body rejection is turned into an [`AppError`], so malformed input
//! always answers `400 {"error": ...}`.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Json,
};
use axum_extra::extract::Multipart;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    error::AppError,
    models::equipment::{EquipmentForm, EquipmentJson, EquipmentStatus, PhotoUpload},
};

/// JSON body that is deserialized and then validated
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// URL path parameters, rejected with a 400 `{"error"}` body when they do not parse
pub struct PathParam<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(PathParam(value))
    }
}

/// Equipment changes sent either as JSON or as `multipart/form-data`
///
/// JSON bodies must carry `nome` and `valor_diario`. Multipart forms only
/// carry the fields to change, plus an optional `foto` file.
pub struct EquipmentPayload(pub EquipmentForm);

#[async_trait]
impl<S> FromRequest<S> for EquipmentPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let ValidatedJson(json) = ValidatedJson::<EquipmentJson>::from_request(req, state).await?;
            return Ok(EquipmentPayload(json.into()));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.to_string()))?;
        let form = read_form(&mut multipart).await?;
        form.validate()?;
        Ok(EquipmentPayload(form))
    }
}

async fn read_form(multipart: &mut Multipart) -> Result<EquipmentForm, AppError> {
    let mut form = EquipmentForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "foto" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("foto: {}", e)))?;
            // Browsers send an empty part when no file was picked
            if !file_name.is_empty() && !bytes.is_empty() {
                form.photo = Some(PhotoUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("{}: {}", name, e)))?;
        if value.is_empty() {
            continue;
        }

        match name.as_str() {
            "nome" => form.name = Some(value),
            "status" => {
                let status = value
                    .parse::<EquipmentStatus>()
                    .map_err(|e| AppError::Validation(format!("status: {}", e)))?;
                form.status = Some(status);
            }
            "valor_diario" => {
                let rate = value
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|_| AppError::Validation(format!("valor_diario: invalid decimal '{}'", value)))?;
                form.daily_rate = Some(rate);
            }
            other => {
                return Err(AppError::Validation(format!("unknown field `{}`", other)));
            }
        }
    }

    Ok(form)
}
