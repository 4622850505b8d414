//! Protected media files

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};

use super::{extract::PathParam, AuthenticatedUser};
use crate::{
    error::{AppError, AppResult},
    services::storage::content_type,
    AppState,
};

/// Serve an uploaded photo to staff
pub async fn serve_media(
    State(state): State<AppState>,
    AuthenticatedUser(_): AuthenticatedUser,
    PathParam(path): PathParam<String>,
) -> AppResult<impl IntoResponse> {
    let bytes = state
        .services
        .equipment
        .media(&path)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media file {} not found", path)))?;
    Ok(([(CONTENT_TYPE, content_type(&path))], bytes))
}
