//! Equipment status synchronization
//!
//! Rental transitions produce [`EquipmentEffect`]s that the rentals service
//! applies in the same transaction as the rental write.

use serde::Deserialize;

use crate::models::{EquipmentStatus, RentalStatus};

/// How equipment status follows its rentals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSyncPolicy {
    /// Recompute the status of every touched equipment from its active rentals
    Derived,
    /// Patch the status on each transition, without looking at other rentals
    Incremental,
}

/// The part of a rental that drives its equipment status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalLink {
    pub equipment_id: i32,
    pub status: RentalStatus,
}

impl RentalLink {
    pub fn new(equipment_id: i32, status: RentalStatus) -> Self {
        Self { equipment_id, status }
    }

    fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentEffect {
    Set {
        equipment_id: i32,
        status: EquipmentStatus,
    },
    Recompute {
        equipment_id: i32,
    },
}

impl EquipmentEffect {
    pub fn equipment_id(&self) -> i32 {
        match self {
            EquipmentEffect::Set { equipment_id, .. } => *equipment_id,
            EquipmentEffect::Recompute { equipment_id } => *equipment_id,
        }
    }
}

fn set(equipment_id: i32, status: EquipmentStatus) -> EquipmentEffect {
    EquipmentEffect::Set { equipment_id, status }
}

fn recompute(equipment_id: i32) -> EquipmentEffect {
    EquipmentEffect::Recompute { equipment_id }
}

/// Status of an equipment item given how many active rentals reference it
///
/// Maintenance and unavailable are set by staff and survive the last rental
/// ending; only `rented` falls back to `available`.
pub fn derive_status(current: EquipmentStatus, active_rentals: i64) -> EquipmentStatus {
    if active_rentals > 0 {
        EquipmentStatus::Rented
    } else if current == EquipmentStatus::Rented {
        EquipmentStatus::Available
    } else {
        current
    }
}

/// Whether a write puts an active rental on equipment it was not active on before
pub fn claims_equipment(before: Option<RentalLink>, after: RentalLink) -> bool {
    after.is_active()
        && match before {
            None => true,
            Some(before) => !before.is_active() || before.equipment_id != after.equipment_id,
        }
}

impl StatusSyncPolicy {
    pub fn on_create(self, created: RentalLink) -> Vec<EquipmentEffect> {
        match self {
            StatusSyncPolicy::Derived => vec![recompute(created.equipment_id)],
            StatusSyncPolicy::Incremental if created.is_active() => {
                vec![set(created.equipment_id, EquipmentStatus::Rented)]
            }
            StatusSyncPolicy::Incremental => Vec::new(),
        }
    }

    pub fn on_update(self, before: RentalLink, after: RentalLink) -> Vec<EquipmentEffect> {
        let moved = before.equipment_id != after.equipment_id;
        match self {
            StatusSyncPolicy::Derived => {
                let mut effects = Vec::with_capacity(2);
                if moved {
                    effects.push(recompute(before.equipment_id));
                }
                effects.push(recompute(after.equipment_id));
                effects
            }
            StatusSyncPolicy::Incremental => {
                let mut effects = Vec::new();
                if moved {
                    effects.push(set(before.equipment_id, EquipmentStatus::Available));
                }
                match (before.is_active(), after.is_active()) {
                    (false, true) => effects.push(set(after.equipment_id, EquipmentStatus::Rented)),
                    (true, false) => {
                        effects.push(set(after.equipment_id, EquipmentStatus::Available))
                    }
                    _ => {}
                }
                effects
            }
        }
    }

    pub fn on_delete(self, deleted: RentalLink) -> Vec<EquipmentEffect> {
        match self {
            StatusSyncPolicy::Derived => vec![recompute(deleted.equipment_id)],
            StatusSyncPolicy::Incremental if deleted.is_active() => {
                vec![set(deleted.equipment_id, EquipmentStatus::Available)]
            }
            StatusSyncPolicy::Incremental => Vec::new(),
        }
    }

    /// Explicit close and expiry close
    pub fn on_close(self, closed: RentalLink) -> Vec<EquipmentEffect> {
        match self {
            StatusSyncPolicy::Derived => vec![recompute(closed.equipment_id)],
            StatusSyncPolicy::Incremental => {
                vec![set(closed.equipment_id, EquipmentStatus::Available)]
            }
        }
    }

    /// Rentals removed by a cascading client delete
    pub fn on_cascade_delete(self, equipment_ids: &[i32]) -> Vec<EquipmentEffect> {
        match self {
            StatusSyncPolicy::Derived => equipment_ids.iter().copied().map(recompute).collect(),
            StatusSyncPolicy::Incremental => Vec::new(),
        }
    }
}
