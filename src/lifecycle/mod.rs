//! Rental lifecycle rules
//!
//! Pure functions with no I/O: hourly billing, equipment status
//! synchronization and the close/expiry transitions. Services load the rows,
//! ask these rules what to write, and persist the result in one transaction.

pub mod billing;
pub mod closing;
pub mod sync;

pub use closing::{ClosePlan, CloseReason};
pub use sync::{EquipmentEffect, RentalLink, StatusSyncPolicy};
