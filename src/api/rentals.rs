//! Rental endpoints

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::{
    extract::{PathParam, ValidatedJson},
    AuthenticatedUser, MessageResponse,
};
use crate::{
    error::{AppError, AppResult},
    models::rental::{CloseRental, CreateRental, RentalResponse, UpdateRental},
    AppState,
};

/// Expiry sweep result
#[derive(Serialize, ToSchema)]
pub struct SweepResponse {
    pub closed_count: u64,
    pub message: String,
}

/// List rentals, newest first
#[utoipa::path(
    get,
    path = "/alugueis/",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Rentals", body = Vec<RentalResponse>)
    )
)]
pub async fn list_rentals(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalResponse>>> {
    let rentals = state.services.rentals.list().await?;
    Ok(Json(rentals))
}

/// Create a rental
#[utoipa::path(
    post,
    path = "/alugueis/",
    tag = "rentals",
    security(("bearer_auth" = [])),
    request_body = CreateRental,
    responses(
        (status = 201, description = "Rental created", body = RentalResponse),
        (status = 400, description = "Invalid data", body = crate::error::ErrorResponse),
        (status = 404, description = "Client or equipment not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Equipment already rented", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_rental(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    ValidatedJson(data): ValidatedJson<CreateRental>,
) -> AppResult<(StatusCode, Json<RentalResponse>)> {
    let rental = state.services.rentals.create(data).await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

/// Get rental by ID
#[utoipa::path(
    get,
    path = "/alugueis/{id}/",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Rental details", body = RentalResponse),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_rental(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
) -> AppResult<Json<RentalResponse>> {
    let rental = state.services.rentals.get_by_id(id).await?;
    Ok(Json(rental))
}

/// Update a rental; absent fields are kept
#[utoipa::path(
    put,
    path = "/alugueis/{id}/",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    request_body = UpdateRental,
    responses(
        (status = 200, description = "Rental updated", body = RentalResponse),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Equipment already rented", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_rental(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
    ValidatedJson(data): ValidatedJson<UpdateRental>,
) -> AppResult<Json<RentalResponse>> {
    let rental = state.services.rentals.update(id, data).await?;
    Ok(Json(rental))
}

/// Delete a rental
#[utoipa::path(
    delete,
    path = "/alugueis/{id}/",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 204, description = "Rental deleted", body = MessageResponse),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_rental(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.services.rentals.delete(id).await?;
    Ok((
        StatusCode::NO_CONTENT,
        Json(MessageResponse::new("Aluguel deletado com sucesso")),
    ))
}

/// Close a rental
///
/// The body is optional; an empty body closes at the stored end date, or now.
#[utoipa::path(
    post,
    path = "/alugueis/{id}/close/",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    request_body = CloseRental,
    responses(
        (status = 200, description = "Rental closed", body = RentalResponse),
        (status = 400, description = "Invalid end date", body = crate::error::ErrorResponse),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn close_rental(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
    body: Bytes,
) -> AppResult<Json<RentalResponse>> {
    let data = parse_close_body(&body)?;
    let rental = state.services.rentals.close(id, data).await?;
    Ok(Json(rental))
}

/// Close every rental whose end date has passed
#[utoipa::path(
    post,
    path = "/alugueis/check-expired/",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep result", body = SweepResponse)
    )
)]
pub async fn check_expired(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> AppResult<Json<SweepResponse>> {
    let closed_count = state.services.rentals.close_expired().await?;
    Ok(Json(SweepResponse {
        closed_count,
        message: format!("{} aluguel(is) fechado(s) automaticamente", closed_count),
    }))
}

fn parse_close_body(body: &[u8]) -> AppResult<CloseRental> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CloseRental::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}
