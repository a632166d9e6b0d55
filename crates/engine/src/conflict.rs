//! Conflict detection against the store.
//!
//! Loads the slots sharing a candidate's instant, resolves the family of every
//! person and vehicle involved through the directory, and hands the result to the
//! pure classifier in `carpool_core::conflict`.

use std::sync::Arc;

use carpool_core::collaborators::Directory;
use carpool_core::conflict::{self, ConflictCandidate, FamilyIndex};
use carpool_core::errors::{SlotError, SlotResult};
use carpool_core::models::conflict::Conflict;
use carpool_core::models::slot::SlotDetails;
use carpool_core::store::SlotReads;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::settings::ConflictScope;

#[derive(Clone)]
pub struct ConflictDetector {
    directory: Arc<dyn Directory>,
    scope: ConflictScope,
}

impl ConflictDetector {
    pub fn new(directory: Arc<dyn Directory>, scope: ConflictScope) -> Self {
        Self { directory, scope }
    }

    /// Slots at exactly `datetime` within the configured scope.
    pub async fn slots_at<R: SlotReads>(
        &self,
        reads: &mut R,
        group_id: Uuid,
        datetime: DateTime<Utc>,
        exclude_slot_id: Option<Uuid>,
    ) -> SlotResult<Vec<SlotDetails>> {
        let slots = reads
            .slots_at_instant(datetime, self.scope.restrict_to(group_id), exclude_slot_id)
            .await?;
        Ok(slots)
    }

    pub async fn find_conflicts<R: SlotReads>(
        &self,
        reads: &mut R,
        group_id: Uuid,
        candidate: &ConflictCandidate,
        exclude_slot_id: Option<Uuid>,
    ) -> SlotResult<Vec<Conflict>> {
        let others = self
            .slots_at(reads, group_id, candidate.datetime, exclude_slot_id)
            .await?;
        self.classify(candidate, &others).await
    }

    /// Fails with [`SlotError::DoubleBooking`] when any blocking conflict exists,
    /// otherwise returns the advisory conflicts.
    pub async fn ensure_not_blocked<R: SlotReads>(
        &self,
        reads: &mut R,
        group_id: Uuid,
        candidate: &ConflictCandidate,
        exclude_slot_id: Option<Uuid>,
    ) -> SlotResult<Vec<Conflict>> {
        let conflicts = self
            .find_conflicts(reads, group_id, candidate, exclude_slot_id)
            .await?;

        let blocking = conflict::blocking(&conflicts);
        if !blocking.is_empty() {
            warn!(
                "Rejecting mutation at {}: {} blocking conflict(s)",
                candidate.datetime,
                blocking.len()
            );
            return Err(SlotError::double_booking(blocking));
        }

        if !conflicts.is_empty() {
            debug!(
                "{} advisory conflict(s) at {}",
                conflicts.len(),
                candidate.datetime
            );
        }
        Ok(conflicts)
    }

    pub async fn classify(
        &self,
        candidate: &ConflictCandidate,
        others: &[SlotDetails],
    ) -> SlotResult<Vec<Conflict>> {
        if others.is_empty() {
            return Ok(vec![]);
        }
        let families = self.family_index(candidate, others).await?;
        Ok(conflict::dedup(conflict::classify(candidate, others, &families)))
    }

    async fn family_index(
        &self,
        candidate: &ConflictCandidate,
        others: &[SlotDetails],
    ) -> SlotResult<FamilyIndex> {
        let mut index = FamilyIndex::new();

        if let Some(vehicle_id) = candidate.vehicle_id
            && let Some(vehicle) = self.directory.vehicle(vehicle_id).await?
        {
            index.insert(vehicle_id, vehicle.family_id);
        }
        if let Some(driver_id) = candidate.driver_id {
            self.index_user(&mut index, driver_id).await?;
        }
        if let Some(child_id) = candidate.child_id {
            self.index_child(&mut index, child_id).await?;
        }

        // Family conflicts need a family on the candidate side.
        if !candidate.affiliated_ids().into_iter().any(|id| index.contains(id)) {
            return Ok(index);
        }

        for other in others {
            for driver_id in other.vehicles.iter().filter_map(|va| va.driver_id) {
                if !index.contains(driver_id) {
                    self.index_user(&mut index, driver_id).await?;
                }
            }
            for ca in &other.children {
                if !index.contains(ca.child_id) {
                    self.index_child(&mut index, ca.child_id).await?;
                }
            }
        }

        Ok(index)
    }

    async fn index_user(&self, index: &mut FamilyIndex, user_id: Uuid) -> SlotResult<()> {
        if let Some(user) = self.directory.user(user_id).await?
            && let Some(family_id) = user.family_id
        {
            index.insert(user_id, family_id);
        }
        Ok(())
    }

    async fn index_child(&self, index: &mut FamilyIndex, child_id: Uuid) -> SlotResult<()> {
        if let Some(child) = self.directory.child(child_id).await? {
            index.insert(child_id, child.family_id);
        }
        Ok(())
    }
}
