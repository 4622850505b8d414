//! Dashboard endpoint

use axum::{extract::State, Json};

use super::AuthenticatedUser;
use crate::{error::AppResult, services::dashboard::DashboardStats, AppState};

/// Dashboard statistics
#[utoipa::path(
    get,
    path = "/dashboard/stats/",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.dashboard.stats().await?;
    Ok(Json(stats))
}
