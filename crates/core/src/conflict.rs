//! Pure conflict classification.
//!
//! Slots are instants, so two commitments conflict only when their slots share the
//! exact same `datetime`. Loading the slots and family affiliations is the caller's
//! job; this module only decides what conflicts the loaded data contains.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::capacity;
use crate::models::conflict::{Conflict, ConflictType, Severity};
use crate::models::slot::SlotDetails;

/// The commitment about to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictCandidate {
    pub datetime: DateTime<Utc>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub child_id: Option<Uuid>,
}

impl ConflictCandidate {
    pub fn at(datetime: DateTime<Utc>) -> Self {
        Self {
            datetime,
            vehicle_id: None,
            driver_id: None,
            child_id: None,
        }
    }

    pub fn vehicle(mut self, vehicle_id: Uuid) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }

    pub fn driver(mut self, driver_id: Option<Uuid>) -> Self {
        self.driver_id = driver_id;
        self
    }

    pub fn child(mut self, child_id: Uuid) -> Self {
        self.child_id = Some(child_id);
        self
    }

    /// Ids whose family affiliation matters for this candidate.
    pub fn affiliated_ids(&self) -> Vec<Uuid> {
        [self.vehicle_id, self.driver_id, self.child_id]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Maps vehicles, users and children to the family they belong to.
#[derive(Debug, Clone, Default)]
pub struct FamilyIndex {
    families: HashMap<Uuid, Uuid>,
}

impl FamilyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, member_id: Uuid, family_id: Uuid) {
        self.families.insert(member_id, family_id);
    }

    pub fn contains(&self, member_id: Uuid) -> bool {
        self.families.contains_key(&member_id)
    }

    pub fn family_of(&self, member_id: Uuid) -> Option<Uuid> {
        self.families.get(&member_id).copied()
    }
}

pub fn classify(
    candidate: &ConflictCandidate,
    others: &[SlotDetails],
    families: &FamilyIndex,
) -> Vec<Conflict> {
    let candidate_families: HashSet<Uuid> = candidate
        .affiliated_ids()
        .into_iter()
        .filter_map(|id| families.family_of(id))
        .collect();

    let mut conflicts = Vec::new();

    for other in others
        .iter()
        .filter(|s| s.slot.datetime == candidate.datetime)
    {
        let slot_id = other.slot.id;

        for va in &other.vehicles {
            if candidate.vehicle_id == Some(va.vehicle_id) {
                conflicts.push(Conflict::new(
                    ConflictType::VehicleDoubleBooking,
                    slot_id,
                    va.vehicle_id,
                    format!(
                        "Vehicle {} is already assigned to slot {} at {}",
                        va.vehicle_id,
                        slot_id,
                        other.slot.datetime.to_rfc3339()
                    ),
                ));
            }

            let Some(driver_id) = va.driver_id else {
                continue;
            };
            if candidate.driver_id == Some(driver_id) {
                conflicts.push(Conflict::new(
                    ConflictType::DriverDoubleBooking,
                    slot_id,
                    driver_id,
                    format!(
                        "Driver {} is already driving in slot {} at {}",
                        driver_id,
                        slot_id,
                        other.slot.datetime.to_rfc3339()
                    ),
                ));
            } else if let Some(family_id) = families.family_of(driver_id)
                && candidate_families.contains(&family_id)
            {
                conflicts.push(Conflict::new(
                    ConflictType::FamilyDoubleBooking,
                    slot_id,
                    driver_id,
                    format!(
                        "Driver {} of family {} is committed to slot {} at the same time",
                        driver_id, family_id, slot_id
                    ),
                ));
            }
        }

        for ca in &other.children {
            if candidate.child_id == Some(ca.child_id) {
                conflicts.push(Conflict::new(
                    ConflictType::ChildDoubleBooking,
                    slot_id,
                    ca.child_id,
                    format!(
                        "Child {} is already riding in slot {} at {}",
                        ca.child_id,
                        slot_id,
                        other.slot.datetime.to_rfc3339()
                    ),
                ));
            } else if let Some(family_id) = families.family_of(ca.child_id)
                && candidate_families.contains(&family_id)
            {
                conflicts.push(
                    Conflict::new(
                        ConflictType::FamilyDoubleBooking,
                        slot_id,
                        ca.child_id,
                        format!(
                            "Child {} of family {} is riding in slot {} at the same time",
                            ca.child_id, family_id, slot_id
                        ),
                    )
                    .with_severity(Severity::Low),
                );
            }
        }
    }

    conflicts
}

/// Assignments of `slot` whose occupancy already exceeds their effective capacity.
/// `base_capacities` maps vehicle id to the vehicle's base capacity.
pub fn overbooking(slot: &SlotDetails, base_capacities: &HashMap<Uuid, i32>) -> Vec<Conflict> {
    slot.vehicles
        .iter()
        .filter_map(|va| {
            let base = *base_capacities.get(&va.vehicle_id)?;
            let effective = capacity::effective_capacity(va.seat_override, base);
            let occupancy = slot.occupancy(va.id);
            (occupancy as i32 > effective).then(|| {
                Conflict::new(
                    ConflictType::VehicleOverbooking,
                    slot.slot.id,
                    va.vehicle_id,
                    format!(
                        "Vehicle {} is over capacity ({}/{})",
                        va.vehicle_id, occupancy, effective
                    ),
                )
            })
        })
        .collect()
}

/// Drops repeated reports of the same resource in the same slot, keeping the first.
pub fn dedup(conflicts: Vec<Conflict>) -> Vec<Conflict> {
    let mut seen = HashSet::new();
    conflicts
        .into_iter()
        .filter(|c| seen.insert((c.conflict_type, c.slot_id, c.resource_id)))
        .collect()
}

pub fn blocking(conflicts: &[Conflict]) -> Vec<Conflict> {
    conflicts.iter().filter(|c| c.blocking).cloned().collect()
}
