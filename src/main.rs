//! Rental Server - Equipment Rental Management
//!
//! REST API server for staff managing clients, equipment and rentals.

use axum::{
    routing::{get, post, MethodRouter},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rental_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{clock::SystemClock, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rental_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Rental Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, &config, Arc::new(SystemClock))
        .expect("Failed to create services");

    services.auth.ensure_bootstrap_account().await?;

    tracing::info!(
        "Equipment status sync: {:?}, overlapping rentals allowed: {}",
        config.rentals.equipment_status_sync,
        config.rentals.allow_overlapping
    );

    let addr = SocketAddr::new(
        config.server.host.parse().expect("Invalid host address"),
        config.server.port,
    );
    let sweep_interval = config.rentals.sweep_interval_secs;

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    if sweep_interval > 0 {
        spawn_expiry_sweep(state.clone(), Duration::from_secs(sweep_interval));
    }

    // Build router
    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run the expiry sweep periodically
fn spawn_expiry_sweep(state: AppState, every: Duration) {
    tracing::info!("Expiry sweep runs every {:?}", every);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match state.services.rentals.close_expired().await {
                Ok(0) => tracing::debug!("Expiry sweep found nothing to close"),
                Ok(count) => tracing::info!("Expiry sweep closed {} rental(s)", count),
                Err(e) => tracing::error!("Expiry sweep failed: {}", e),
            }
        }
    });
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.config.storage.max_upload_bytes + 64 * 1024;

    let routes = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me));

    // Resource routes answer with and without the trailing slash
    let resources: [(&str, MethodRouter<AppState>); 9] = [
        (
            "/clientes",
            get(api::clients::list_clients).post(api::clients::create_client),
        ),
        (
            "/clientes/:id",
            get(api::clients::get_client)
                .put(api::clients::update_client)
                .delete(api::clients::delete_client),
        ),
        (
            "/equipamentos",
            get(api::equipment::list_equipment).post(api::equipment::create_equipment),
        ),
        (
            "/equipamentos/:id",
            get(api::equipment::get_equipment)
                .put(api::equipment::update_equipment)
                .patch(api::equipment::update_equipment)
                .delete(api::equipment::delete_equipment),
        ),
        (
            "/alugueis",
            get(api::rentals::list_rentals).post(api::rentals::create_rental),
        ),
        ("/alugueis/check-expired", post(api::rentals::check_expired)),
        (
            "/alugueis/:id",
            get(api::rentals::get_rental)
                .put(api::rentals::update_rental)
                .delete(api::rentals::delete_rental),
        ),
        ("/alugueis/:id/close", post(api::rentals::close_rental)),
        ("/dashboard/stats", get(api::dashboard::get_stats)),
    ];
    let routes = resources
        .into_iter()
        .fold(routes, |router, (path, handler)| {
            router
                .route(&format!("{}/", path), handler.clone())
                .route(path, handler)
        })
        .with_state(state.clone());

    let media = Router::new()
        .route("/media/*path", get(api::media::serve_media))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api", routes)
        .merge(media)
        .merge(openapi)
        .layer(axum::extract::DefaultBodyLimit::max(upload_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
