//! Equipment rental management server
//!
//! A REST JSON backend for staff who track clients, rentable equipment and
//! rental agreements. Rentals drive equipment availability, are billed by the
//! hour and are closed automatically once their end date has passed.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
