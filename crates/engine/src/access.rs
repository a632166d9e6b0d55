//! Authorization gates shared by the mutation and query paths.
//!
//! A denied check is reported as [`SlotError::NotFound`] with the same message a
//! missing resource would produce, so callers cannot probe for existence.

use std::sync::Arc;

use carpool_core::collaborators::AccessPolicy;
use carpool_core::errors::{SlotError, SlotResult};
use carpool_core::models::directory::FamilyResource;
use carpool_core::models::slot::SlotDetails;
use carpool_core::store::SlotReads;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct AccessGate {
    policy: Arc<dyn AccessPolicy>,
}

impl AccessGate {
    pub fn new(policy: Arc<dyn AccessPolicy>) -> Self {
        Self { policy }
    }

    pub async fn require_group(&self, caller_id: Uuid, group_id: Uuid) -> SlotResult<()> {
        if self.policy.caller_has_slot_access(caller_id, group_id).await? {
            return Ok(());
        }
        debug!("Caller {} denied access to group {}", caller_id, group_id);
        Err(SlotError::NotFound(format!("Group {} not found", group_id)))
    }

    pub async fn require_slot(&self, caller_id: Uuid, slot: &SlotDetails) -> SlotResult<()> {
        if self
            .policy
            .caller_has_slot_access(caller_id, slot.slot.group_id)
            .await?
        {
            return Ok(());
        }
        debug!("Caller {} denied access to slot {}", caller_id, slot.slot.id);
        Err(slot_not_found(slot.slot.id))
    }

    pub async fn require_family(&self, caller_id: Uuid, resource: FamilyResource) -> SlotResult<()> {
        if self.policy.caller_is_family_member(caller_id, resource).await? {
            return Ok(());
        }
        debug!("Caller {} is not a family member of {:?}", caller_id, resource);
        Err(match resource {
            FamilyResource::Child(id) => child_not_found(id),
            FamilyResource::Vehicle(id) => vehicle_not_found(id),
        })
    }
}

pub fn slot_not_found(slot_id: Uuid) -> SlotError {
    SlotError::NotFound(format!("Slot {} not found", slot_id))
}

pub fn vehicle_not_found(vehicle_id: Uuid) -> SlotError {
    SlotError::NotFound(format!("Vehicle {} not found", vehicle_id))
}

pub fn child_not_found(child_id: Uuid) -> SlotError {
    SlotError::NotFound(format!("Child {} not found", child_id))
}

pub fn driver_not_found(driver_id: Uuid) -> SlotError {
    SlotError::NotFound(format!("Driver {} not found", driver_id))
}

pub async fn load_slot<R: SlotReads>(reads: &mut R, slot_id: Uuid) -> SlotResult<SlotDetails> {
    reads
        .slot(slot_id)
        .await?
        .ok_or_else(|| slot_not_found(slot_id))
}
