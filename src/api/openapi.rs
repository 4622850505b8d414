//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, clients, dashboard, equipment, health, rentals};

/// Registers the staff bearer token scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rental Server API",
        version = "1.0.0",
        description = "Equipment rental management REST API"
    ),
    servers(
        (url = "/api", description = "REST API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Clients
        clients::list_clients,
        clients::create_client,
        clients::get_client,
        clients::update_client,
        clients::delete_client,
        // Equipment
        equipment::list_equipment,
        equipment::create_equipment,
        equipment::get_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Rentals
        rentals::list_rentals,
        rentals::create_rental,
        rentals::get_rental,
        rentals::update_rental,
        rentals::delete_rental,
        rentals::close_rental,
        rentals::check_expired,
        // Dashboard
        dashboard::get_stats,
    ),
    components(
        schemas(
            // Auth
            crate::models::staff::LoginRequest,
            auth::LoginResponse,
            auth::StaffInfo,
            // Clients
            crate::models::client::Client,
            crate::models::client::ClientRequest,
            // Equipment
            crate::models::equipment::EquipmentStatus,
            crate::models::equipment::EquipmentJson,
            crate::models::equipment::EquipmentResponse,
            // Rentals
            crate::models::rental::RentalStatus,
            crate::models::rental::RelatedRef,
            crate::models::rental::RentalResponse,
            crate::models::rental::CreateRental,
            crate::models::rental::UpdateRental,
            crate::models::rental::CloseRental,
            rentals::SweepResponse,
            // Dashboard
            crate::services::dashboard::DashboardStats,
            crate::services::dashboard::RecentRental,
            crate::services::dashboard::StatusCount,
            // Health
            health::HealthResponse,
            // Common
            crate::api::MessageResponse,
            crate::error::ErrorResponse,
            crate::error::ErrorCode,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Staff authentication"),
        (name = "clients", description = "Client management"),
        (name = "equipment", description = "Equipment management"),
        (name = "rentals", description = "Rental lifecycle"),
        (name = "dashboard", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
