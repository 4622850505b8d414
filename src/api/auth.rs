//! Staff authentication endpoints

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{extract::ValidatedJson, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::staff::{LoginRequest, StaffUser},
    AppState,
};

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub user: StaffInfo,
}

/// Authenticated staff member
#[derive(Serialize, ToSchema)]
pub struct StaffInfo {
    pub id: i32,
    pub username: String,
    pub is_staff: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<StaffUser> for StaffInfo {
    fn from(user: StaffUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_staff: user.is_staff,
            last_login: user.last_login,
        }
    }
}

/// Log in with a staff account
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user) = state
        .services
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.auth.jwt_expiration_hours * 3600,
        user: user.into(),
    }))
}

/// Current staff member
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current staff member", body = StaffInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StaffInfo>> {
    let user = state.services.auth.get_by_id(claims.staff_id).await?;
    Ok(Json(user.into()))
}
