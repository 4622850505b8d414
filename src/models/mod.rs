//! Data models

pub mod client;
pub mod datetime;
pub mod equipment;
pub mod rental;
pub mod staff;

// Re-export commonly used types
pub use client::Client;
pub use datetime::InputDateTime;
pub use equipment::{Equipment, EquipmentResponse, EquipmentStatus};
pub use rental::{Rental, RentalDetails, RentalResponse, RentalStatus};
pub use staff::{StaffClaims, StaffUser};
