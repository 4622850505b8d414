//! Client endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::{
    extract::{PathParam, ValidatedJson},
    AuthenticatedUser, MessageResponse,
};
use crate::{
    error::AppResult,
    models::client::{Client, ClientRequest},
    AppState,
};

/// List all clients
#[utoipa::path(
    get,
    path = "/clientes/",
    tag = "clients",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Clients ordered by name", body = Vec<Client>)
    )
)]
pub async fn list_clients(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> AppResult<Json<Vec<Client>>> {
    let clients = state.services.clients.list().await?;
    Ok(Json(clients))
}

/// Create a client
#[utoipa::path(
    post,
    path = "/clientes/",
    tag = "clients",
    security(("bearer_auth" = [])),
    request_body = ClientRequest,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Invalid data or duplicate CPF", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_client(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    ValidatedJson(data): ValidatedJson<ClientRequest>,
) -> AppResult<(StatusCode, Json<Client>)> {
    let client = state.services.clients.create(data).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// Get client by ID
#[utoipa::path(
    get,
    path = "/clientes/{id}/",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client details", body = Client),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_client(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
) -> AppResult<Json<Client>> {
    let client = state.services.clients.get_by_id(id).await?;
    Ok(Json(client))
}

/// Replace a client
#[utoipa::path(
    put,
    path = "/clientes/{id}/",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Client ID")),
    request_body = ClientRequest,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_client(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
    ValidatedJson(data): ValidatedJson<ClientRequest>,
) -> AppResult<Json<Client>> {
    let client = state.services.clients.update(id, data).await?;
    Ok(Json(client))
}

/// Delete a client and its rentals
#[utoipa::path(
    delete,
    path = "/clientes/{id}/",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 204, description = "Client deleted", body = MessageResponse),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_client(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    PathParam(id): PathParam<i32>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.services.clients.delete(id).await?;
    Ok((
        StatusCode::NO_CONTENT,
        Json(MessageResponse::new("Cliente deletado com sucesso")),
    ))
}
