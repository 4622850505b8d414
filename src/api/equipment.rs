//! Equipment endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::{
    extract::{EquipmentPayload, PathParam},
    AuthenticatedUser, MessageResponse,
};
use crate::{
    error::AppResult,
    models::equipment::{EquipmentJson, EquipmentResponse},
    AppState,
};

fn respond(state: &AppState, equipment: crate::models::Equipment) -> EquipmentResponse {
    EquipmentResponse::new(equipment, &state.config.storage.media_url)
}

/// List all equipment
#[utoipa::path(
    get,
    path = "/equipamentos/",
    tag = "equipment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Equipment ordered by name", body = Vec<EquipmentResponse>)
    )
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> AppResult<Json<Vec<EquipmentResponse>>> {
    let equipment = state.services.equipment.list().await?;
    Ok(Json(
        equipment.into_iter().map(|e| respond(&state, e)).collect(),
    ))
}

/// Create equipment from JSON or a multipart form with an optional `foto`
#[utoipa::path(
    post,
    path = "/equipamentos/",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body(content = EquipmentJson, description = "JSON body, or multipart/form-data with nome, status, valor_diario and foto"),
    responses(
        (status = 201, description = "Equipment created", body = EquipmentResponse),
        (status = 400, description = "Invalid data", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    EquipmentPayload(data): EquipmentPayload,
) -> AppResult<(StatusCode, Json<EquipmentResponse>)> {
    let equipment = state.services.equipment.create(data).await?;
    Ok((StatusCode::CREATED, Json(respond(&state, equipment))))
}

/// Get equipment by ID
#[utoipa::path(
    get,
    path = "/equipamentos/{id}/",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = EquipmentResponse),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
) -> AppResult<Json<EquipmentResponse>> {
    let equipment = state.services.equipment.get_by_id(id).await?;
    Ok(Json(respond(&state, equipment)))
}

/// Update equipment; PUT and PATCH behave the same
#[utoipa::path(
    put,
    path = "/equipamentos/{id}/",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body(content = EquipmentJson, description = "JSON body, or multipart/form-data carrying only the fields to change"),
    responses(
        (status = 200, description = "Equipment updated", body = EquipmentResponse),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
    EquipmentPayload(data): EquipmentPayload,
) -> AppResult<Json<EquipmentResponse>> {
    let equipment = state.services.equipment.update(id, data).await?;
    Ok(Json(respond(&state, equipment)))
}

/// Delete equipment, its rentals and its photo
#[utoipa::path(
    delete,
    path = "/equipamentos/{id}/",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 204, description = "Equipment deleted", body = MessageResponse),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.services.equipment.delete(id).await?;
    Ok((
        StatusCode::NO_CONTENT,
        Json(MessageResponse::new("Equipamento deletado com sucesso")),
    ))
}
