use std::collections::HashMap;
use std::sync::Arc;

use carpool_core::collaborators::{Collaborators, Directory};
use carpool_core::conflict::{self, ConflictCandidate};
use carpool_core::errors::{SlotError, SlotResult};
use carpool_core::models::assignment::{AvailableChild, ScheduleQuery};
use carpool_core::models::conflict::Conflict;
use carpool_core::models::slot::{SlotDetails, SlotView};
use carpool_core::store::{SlotReads, SlotStore};
use tracing::debug;
use uuid::Uuid;

use crate::access::{AccessGate, load_slot};
use crate::conflict::ConflictDetector;
use crate::settings::EngineSettings;
use crate::view;

/// Read side of the engine. Uses the store's plain read handle; nothing here
/// needs serializable isolation.
pub struct SlotQueryService<S: SlotStore> {
    store: Arc<S>,
    directory: Arc<dyn Directory>,
    access: AccessGate,
    detector: ConflictDetector,
}

impl<S: SlotStore> SlotQueryService<S> {
    pub fn new(store: Arc<S>, collaborators: Collaborators, settings: EngineSettings) -> Self {
        Self {
            store,
            directory: collaborators.directory.clone(),
            access: AccessGate::new(collaborators.access),
            detector: ConflictDetector::new(collaborators.directory, settings.conflict_scope),
        }
    }

    pub async fn get_slot(&self, caller_id: Uuid, slot_id: Uuid) -> SlotResult<SlotView> {
        debug!("Fetching slot {}", slot_id);
        let mut reader = self.store.reader().await?;
        let details = self.visible_slot(&mut reader, caller_id, slot_id).await?;
        view::build_slot_view(self.directory.as_ref(), &details).await
    }

    /// Slots of a group in `[start, end)`, ordered by datetime.
    pub async fn get_schedule(
        &self,
        caller_id: Uuid,
        group_id: Uuid,
        query: ScheduleQuery,
    ) -> SlotResult<Vec<SlotView>> {
        if let (Some(start), Some(end)) = (query.start, query.end)
            && start >= end
        {
            return Err(SlotError::Validation(format!(
                "Schedule range start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        self.access.require_group(caller_id, group_id).await?;

        debug!(
            "Listing schedule for group {} ({:?} .. {:?})",
            group_id, query.start, query.end
        );
        let mut reader = self.store.reader().await?;
        let slots = reader
            .slots_in_range(group_id, query.start, query.end)
            .await?;

        let mut views = Vec::with_capacity(slots.len());
        for details in &slots {
            views.push(view::build_slot_view(self.directory.as_ref(), details).await?);
        }
        Ok(views)
    }

    /// Children of the group's families not yet riding in the slot, flagged with
    /// whether they can be assigned right now.
    pub async fn get_available_children(
        &self,
        caller_id: Uuid,
        slot_id: Uuid,
    ) -> SlotResult<Vec<AvailableChild>> {
        let mut reader = self.store.reader().await?;
        let details = self.visible_slot(&mut reader, caller_id, slot_id).await?;
        let slot = &details.slot;

        let slot_view = view::build_slot_view(self.directory.as_ref(), &details).await?;
        let seats_left = slot_view.total_available_seats() > 0;

        let riding_elsewhere: HashMap<Uuid, Uuid> = self
            .detector
            .slots_at(&mut reader, slot.group_id, slot.datetime, Some(slot.id))
            .await?
            .iter()
            .flat_map(|other| other.children.iter().map(|ca| (ca.child_id, ca.slot_id)))
            .collect();

        let children = self.directory.group_children(slot.group_id).await?;
        let available = children
            .into_iter()
            .filter(|child| details.child_assignment(child.id).is_none())
            .map(|child| {
                let conflict_reason = match riding_elsewhere.get(&child.id) {
                    Some(other_slot) => Some(format!(
                        "Already riding in slot {} at this time",
                        other_slot
                    )),
                    None if !seats_left => Some("No seats available".to_string()),
                    None => None,
                };
                AvailableChild {
                    child_id: child.id,
                    name: child.name,
                    family_id: child.family_id,
                    can_assign: conflict_reason.is_none(),
                    conflict_reason,
                }
            })
            .collect();

        Ok(available)
    }

    /// Overbooking of the slot's own assignments plus every conflict its
    /// vehicles, drivers and children have with slots at the same instant.
    pub async fn get_conflicts(&self, caller_id: Uuid, slot_id: Uuid) -> SlotResult<Vec<Conflict>> {
        let mut reader = self.store.reader().await?;
        let details = self.visible_slot(&mut reader, caller_id, slot_id).await?;
        let slot = &details.slot;

        let vehicles = view::vehicles_of(self.directory.as_ref(), &details).await?;
        let mut conflicts = conflict::overbooking(&details, &view::base_capacities(&vehicles));

        let others = self
            .detector
            .slots_at(&mut reader, slot.group_id, slot.datetime, Some(slot.id))
            .await?;

        for va in &details.vehicles {
            let candidate = ConflictCandidate::at(slot.datetime)
                .vehicle(va.vehicle_id)
                .driver(va.driver_id);
            conflicts.extend(self.detector.classify(&candidate, &others).await?);
        }
        for ca in &details.children {
            let candidate = ConflictCandidate::at(slot.datetime).child(ca.child_id);
            conflicts.extend(self.detector.classify(&candidate, &others).await?);
        }

        let conflicts = conflict::dedup(conflicts);
        debug!("Slot {} has {} conflict(s)", slot_id, conflicts.len());
        Ok(conflicts)
    }

    async fn visible_slot(
        &self,
        reader: &mut S::Reader,
        caller_id: Uuid,
        slot_id: Uuid,
    ) -> SlotResult<SlotDetails> {
        let details = load_slot(reader, slot_id).await?;
        self.access.require_slot(caller_id, &details).await?;
        Ok(details)
    }
}
