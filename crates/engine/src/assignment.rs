//! Mutating operations on slots.
//!
//! Every operation follows the same shape: cheap pre-checks against the
//! directory and a plain read handle, then one serializable transaction that
//! re-reads the slot, re-validates uniqueness, capacity and conflicts, writes and
//! commits. Nothing read before the transaction is trusted for capacity or
//! uniqueness decisions. The transaction as a whole, including the wait to begin
//! it, is bounded by [`EngineSettings::transaction_timeout`]; a create that loses
//! the slot-creation race spends the same budget on both of its transactions.
//! Pre-check reads run outside that bound.

use std::future::Future;
use std::sync::Arc;

use carpool_core::capacity;
use carpool_core::collaborators::{Collaborators, Directory};
use carpool_core::conflict::ConflictCandidate;
use carpool_core::errors::{SlotError, SlotResult};
use carpool_core::models::assignment::{
    AssignVehicleRequest, CreateSlotRequest, RemoveVehicleResponse,
};
use carpool_core::models::conflict::{Conflict, ConflictType};
use carpool_core::models::directory::{Child, FamilyResource, Vehicle};
use carpool_core::models::slot::{
    ChildAssignment, NewVehicleAssignment, SlotDetails, SlotView, VehicleAssignment,
};
use carpool_core::store::{SlotReads, SlotStore, SlotTransaction, StoreError};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access::{
    AccessGate, child_not_found, driver_not_found, load_slot, vehicle_not_found,
};
use crate::conflict::ConflictDetector;
use crate::settings::EngineSettings;
use crate::timing::SlotTimingValidator;
use crate::view::build_slot_view;

enum SlotCreation {
    Ready(SlotDetails),
    /// Another writer committed a slot for the same `(group, datetime)` first.
    Taken,
}

pub struct AssignmentManager<S: SlotStore> {
    store: Arc<S>,
    directory: Arc<dyn Directory>,
    access: AccessGate,
    detector: ConflictDetector,
    timing: SlotTimingValidator,
    settings: EngineSettings,
}

impl<S: SlotStore> AssignmentManager<S> {
    pub fn new(store: Arc<S>, collaborators: Collaborators, settings: EngineSettings) -> Self {
        Self {
            store,
            directory: collaborators.directory.clone(),
            access: AccessGate::new(collaborators.access.clone()),
            detector: ConflictDetector::new(
                collaborators.directory.clone(),
                settings.conflict_scope,
            ),
            timing: SlotTimingValidator::new(
                collaborators.directory,
                collaborators.schedule_config,
            ),
            settings,
        }
    }

    /// Creates the slot for `(group_id, datetime)` with its first vehicle, or
    /// attaches the vehicle when the slot already exists.
    pub async fn create_slot_with_vehicle(
        &self,
        caller_id: Uuid,
        request: CreateSlotRequest,
    ) -> SlotResult<SlotView> {
        capacity::validate_seat_override(request.seat_override)?;
        self.access.require_group(caller_id, request.group_id).await?;
        self.require_vehicle(caller_id, request.vehicle_id).await?;
        self.require_driver(request.driver_id).await?;
        self.timing
            .validate_timing(caller_id, request.datetime)
            .await?;
        self.timing
            .validate_against_schedule_config(request.group_id, request.datetime)
            .await?;

        // Both transactions of a lost race share one deadline.
        let deadline = Instant::now() + self.settings.transaction_timeout;
        let created = self
            .within_deadline(
                "create_slot_with_vehicle",
                deadline,
                self.create_slot_tx(&request),
            )
            .await?;
        let details = match created {
            SlotCreation::Ready(details) => details,
            SlotCreation::Taken => {
                info!(
                    "Slot for group {} at {} was created concurrently, attaching vehicle {}",
                    request.group_id, request.datetime, request.vehicle_id
                );
                self.within_deadline(
                    "create_slot_with_vehicle",
                    deadline,
                    self.attach_to_existing_tx(&request),
                )
                .await?
            }
        };

        build_slot_view(self.directory.as_ref(), &details).await
    }

    pub async fn assign_vehicle(
        &self,
        caller_id: Uuid,
        slot_id: Uuid,
        request: AssignVehicleRequest,
    ) -> SlotResult<VehicleAssignment> {
        capacity::validate_seat_override(request.seat_override)?;
        let details = self.visible_slot(caller_id, slot_id).await?;
        self.require_vehicle(caller_id, request.vehicle_id).await?;
        self.require_driver(request.driver_id).await?;
        self.timing
            .validate_timing(caller_id, details.slot.datetime)
            .await?;

        self.within_timeout("assign_vehicle", self.assign_vehicle_tx(slot_id, &request))
            .await
    }

    /// Removes the vehicle and its riders; the slot goes with its last vehicle.
    pub async fn remove_vehicle(
        &self,
        caller_id: Uuid,
        slot_id: Uuid,
        vehicle_id: Uuid,
    ) -> SlotResult<RemoveVehicleResponse> {
        self.visible_slot(caller_id, slot_id).await?;
        self.access
            .require_family(caller_id, FamilyResource::Vehicle(vehicle_id))
            .await?;

        self.within_timeout("remove_vehicle", self.remove_vehicle_tx(slot_id, vehicle_id))
            .await
    }

    pub async fn update_driver(
        &self,
        caller_id: Uuid,
        slot_id: Uuid,
        vehicle_id: Uuid,
        driver_id: Option<Uuid>,
    ) -> SlotResult<VehicleAssignment> {
        self.visible_slot(caller_id, slot_id).await?;
        self.access
            .require_family(caller_id, FamilyResource::Vehicle(vehicle_id))
            .await?;
        self.require_driver(driver_id).await?;

        self.within_timeout(
            "update_driver",
            self.update_driver_tx(slot_id, vehicle_id, driver_id),
        )
        .await
    }

    /// Lowering the override below the current number of riders is rejected.
    pub async fn update_seat_override(
        &self,
        caller_id: Uuid,
        vehicle_assignment_id: Uuid,
        seat_override: Option<i32>,
    ) -> SlotResult<VehicleAssignment> {
        capacity::validate_seat_override(seat_override)?;

        let mut reader = self.store.reader().await?;
        let assignment = reader
            .vehicle_assignment(vehicle_assignment_id)
            .await?
            .ok_or_else(|| vehicle_assignment_not_found(vehicle_assignment_id))?;
        let details = load_slot(&mut reader, assignment.slot_id).await?;
        drop(reader);
        self.access
            .require_slot(caller_id, &details)
            .await
            .map_err(|err| match err {
                SlotError::NotFound(_) => vehicle_assignment_not_found(vehicle_assignment_id),
                other => other,
            })?;
        let vehicle = self.require_vehicle(caller_id, assignment.vehicle_id).await?;

        self.within_timeout(
            "update_seat_override",
            self.update_seat_override_tx(vehicle_assignment_id, &vehicle, seat_override),
        )
        .await
    }

    pub async fn assign_child(
        &self,
        caller_id: Uuid,
        slot_id: Uuid,
        child_id: Uuid,
        vehicle_assignment_id: Uuid,
    ) -> SlotResult<ChildAssignment> {
        let details = self.visible_slot(caller_id, slot_id).await?;
        let child = self.require_child(caller_id, child_id).await?;
        if !child.belongs_to_group(details.slot.group_id) {
            return Err(SlotError::Validation(format!(
                "Child {} is not a member of group {}",
                child_id, details.slot.group_id
            )));
        }
        self.timing
            .validate_timing(caller_id, details.slot.datetime)
            .await?;

        self.within_timeout(
            "assign_child",
            self.assign_child_tx(slot_id, child_id, vehicle_assignment_id),
        )
        .await
    }

    pub async fn remove_child(&self, caller_id: Uuid, slot_id: Uuid, child_id: Uuid) -> SlotResult<()> {
        self.visible_slot(caller_id, slot_id).await?;
        self.access
            .require_family(caller_id, FamilyResource::Child(child_id))
            .await?;

        self.within_timeout("remove_child", self.remove_child_tx(slot_id, child_id))
            .await
    }

    async fn create_slot_tx(&self, request: &CreateSlotRequest) -> SlotResult<SlotCreation> {
        let mut tx = self.store.begin_serializable().await?;

        let (details, inserted) = match tx.slot_at(request.group_id, request.datetime).await? {
            Some(existing) => (existing, false),
            None => match tx.insert_slot(request.group_id, request.datetime).await {
                Ok(slot) => (
                    SlotDetails {
                        slot,
                        vehicles: vec![],
                        children: vec![],
                    },
                    true,
                ),
                // Dropping the transaction rolls it back.
                Err(StoreError::UniqueViolation { .. } | StoreError::Serialization(_)) => {
                    return Ok(SlotCreation::Taken);
                }
                Err(err) => return Err(err.into()),
            },
        };

        match self.finish_slot_tx(tx, &details, request).await {
            Ok(details) => {
                info!(
                    "Vehicle {} assigned to slot {} (group {}, {})",
                    request.vehicle_id,
                    details.slot.id,
                    details.slot.group_id,
                    details.slot.datetime
                );
                Ok(SlotCreation::Ready(details))
            }
            // A concurrent creator of the same (group, datetime) committed
            // first; the store reports that as a serialization failure.
            Err(SlotError::SerializationFailure(message)) if inserted => {
                debug!(
                    "Slot creation for group {} at {} lost a race: {}",
                    request.group_id, request.datetime, message
                );
                Ok(SlotCreation::Taken)
            }
            Err(err) => Err(err),
        }
    }

    async fn finish_slot_tx(
        &self,
        mut tx: S::Tx,
        details: &SlotDetails,
        request: &CreateSlotRequest,
    ) -> SlotResult<SlotDetails> {
        self.attach_vehicle(
            &mut tx,
            details,
            request.vehicle_id,
            request.driver_id,
            request.seat_override,
        )
        .await?;
        let details = load_slot(&mut tx, details.slot.id).await?;
        tx.commit().await?;
        Ok(details)
    }

    async fn attach_to_existing_tx(&self, request: &CreateSlotRequest) -> SlotResult<SlotDetails> {
        let mut tx = self.store.begin_serializable().await?;

        let existing = tx
            .slot_at(request.group_id, request.datetime)
            .await?
            .ok_or_else(|| {
                SlotError::Transient(format!(
                    "Slot for group {} at {} changed concurrently",
                    request.group_id, request.datetime
                ))
            })?;

        self.attach_vehicle(
            &mut tx,
            &existing,
            request.vehicle_id,
            request.driver_id,
            request.seat_override,
        )
        .await?;
        let details = load_slot(&mut tx, existing.slot.id).await?;
        tx.commit().await?;

        info!(
            "Vehicle {} attached to existing slot {}",
            request.vehicle_id, details.slot.id
        );
        Ok(details)
    }

    async fn assign_vehicle_tx(
        &self,
        slot_id: Uuid,
        request: &AssignVehicleRequest,
    ) -> SlotResult<VehicleAssignment> {
        let mut tx = self.store.begin_serializable().await?;
        let details = load_slot(&mut tx, slot_id).await?;

        let assignment = self
            .attach_vehicle(
                &mut tx,
                &details,
                request.vehicle_id,
                request.driver_id,
                request.seat_override,
            )
            .await?;
        tx.commit().await?;

        info!("Vehicle {} assigned to slot {}", request.vehicle_id, slot_id);
        Ok(assignment)
    }

    async fn remove_vehicle_tx(
        &self,
        slot_id: Uuid,
        vehicle_id: Uuid,
    ) -> SlotResult<RemoveVehicleResponse> {
        let mut tx = self.store.begin_serializable().await?;
        let details = load_slot(&mut tx, slot_id).await?;

        let assignment = details
            .assignment_for_vehicle(vehicle_id)
            .ok_or_else(|| {
                SlotError::NotFound(format!(
                    "Vehicle {} is not assigned to slot {}",
                    vehicle_id, slot_id
                ))
            })?;
        tx.delete_vehicle_assignment(assignment.id).await?;

        let slot_deleted = details.vehicles.len() == 1;
        if slot_deleted {
            tx.delete_slot(slot_id).await?;
        }
        tx.commit().await?;

        info!(
            "Vehicle {} removed from slot {} ({} rider(s) unassigned, slot deleted: {})",
            vehicle_id,
            slot_id,
            details.occupancy(assignment.id),
            slot_deleted
        );
        Ok(RemoveVehicleResponse { slot_deleted })
    }

    async fn update_driver_tx(
        &self,
        slot_id: Uuid,
        vehicle_id: Uuid,
        driver_id: Option<Uuid>,
    ) -> SlotResult<VehicleAssignment> {
        let mut tx = self.store.begin_serializable().await?;
        let details = load_slot(&mut tx, slot_id).await?;

        let assignment = details
            .assignment_for_vehicle(vehicle_id)
            .ok_or_else(|| {
                SlotError::NotFound(format!(
                    "Vehicle {} is not assigned to slot {}",
                    vehicle_id, slot_id
                ))
            })?;

        if let Some(driver_id) = driver_id {
            ensure_driver_free_in_slot(&details, driver_id, Some(assignment.id))?;
            let candidate = ConflictCandidate::at(details.slot.datetime).driver(Some(driver_id));
            self.detector
                .ensure_not_blocked(&mut tx, details.slot.group_id, &candidate, Some(slot_id))
                .await?;
        }

        let updated = tx
            .update_vehicle_assignment(assignment.id, driver_id, assignment.seat_override)
            .await?;
        tx.commit().await?;

        info!(
            "Driver of vehicle {} in slot {} set to {:?}",
            vehicle_id, slot_id, driver_id
        );
        Ok(updated)
    }

    async fn update_seat_override_tx(
        &self,
        vehicle_assignment_id: Uuid,
        vehicle: &Vehicle,
        seat_override: Option<i32>,
    ) -> SlotResult<VehicleAssignment> {
        let mut tx = self.store.begin_serializable().await?;
        let assignment = tx
            .vehicle_assignment(vehicle_assignment_id)
            .await?
            .ok_or_else(|| vehicle_assignment_not_found(vehicle_assignment_id))?;
        let details = load_slot(&mut tx, assignment.slot_id).await?;

        let occupancy = details.occupancy(assignment.id);
        let effective = capacity::effective_capacity(seat_override, vehicle.capacity);
        if occupancy as i32 > effective {
            return Err(SlotError::Capacity(format!(
                "Vehicle {} cannot drop to {} seat(s): {} children are already assigned",
                vehicle.name, effective, occupancy
            )));
        }

        let updated = tx
            .update_vehicle_assignment(assignment.id, assignment.driver_id, seat_override)
            .await?;
        tx.commit().await?;

        info!(
            "Seat override of vehicle assignment {} set to {:?}",
            vehicle_assignment_id, seat_override
        );
        Ok(updated)
    }

    async fn assign_child_tx(
        &self,
        slot_id: Uuid,
        child_id: Uuid,
        vehicle_assignment_id: Uuid,
    ) -> SlotResult<ChildAssignment> {
        let mut tx = self.store.begin_serializable().await?;
        let details = load_slot(&mut tx, slot_id).await?;

        let assignment = details
            .vehicle_assignment(vehicle_assignment_id)
            .ok_or_else(|| {
                SlotError::NotFound(format!(
                    "Vehicle assignment {} not found in slot {}",
                    vehicle_assignment_id, slot_id
                ))
            })?;
        if details.child_assignment(child_id).is_some() {
            return Err(child_already_assigned(child_id, slot_id));
        }

        let vehicle = self
            .directory
            .vehicle(assignment.vehicle_id)
            .await?
            .ok_or_else(|| vehicle_not_found(assignment.vehicle_id))?;
        let effective = capacity::effective_capacity(assignment.seat_override, vehicle.capacity);
        let occupancy = details.occupancy(assignment.id);
        if !capacity::has_free_seat(effective, occupancy) {
            return Err(SlotError::Capacity(format!(
                "Vehicle {} is at full capacity ({}/{})",
                vehicle.name, occupancy, effective
            )));
        }

        let candidate = ConflictCandidate::at(details.slot.datetime).child(child_id);
        self.detector
            .ensure_not_blocked(&mut tx, details.slot.group_id, &candidate, Some(slot_id))
            .await?;

        let created = tx
            .insert_child_assignment(slot_id, assignment.id, child_id)
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation { .. } => child_already_assigned(child_id, slot_id),
                other => other.into(),
            })?;
        tx.commit().await?;

        info!(
            "Child {} assigned to vehicle {} in slot {} ({}/{})",
            child_id,
            vehicle.name,
            slot_id,
            occupancy + 1,
            effective
        );
        Ok(created)
    }

    async fn remove_child_tx(&self, slot_id: Uuid, child_id: Uuid) -> SlotResult<()> {
        let mut tx = self.store.begin_serializable().await?;
        let details = load_slot(&mut tx, slot_id).await?;

        let assignment = details.child_assignment(child_id).ok_or_else(|| {
            SlotError::NotFound(format!(
                "Child {} is not assigned to slot {}",
                child_id, slot_id
            ))
        })?;
        tx.delete_child_assignment(assignment.id).await?;
        tx.commit().await?;

        info!("Child {} removed from slot {}", child_id, slot_id);
        Ok(())
    }

    /// Uniqueness and conflict checks for a new vehicle assignment, then the insert.
    async fn attach_vehicle<T: SlotTransaction>(
        &self,
        tx: &mut T,
        details: &SlotDetails,
        vehicle_id: Uuid,
        driver_id: Option<Uuid>,
        seat_override: Option<i32>,
    ) -> SlotResult<VehicleAssignment> {
        let slot = &details.slot;
        if details.assignment_for_vehicle(vehicle_id).is_some() {
            return Err(vehicle_already_assigned(vehicle_id, slot.id));
        }
        if let Some(driver_id) = driver_id {
            ensure_driver_free_in_slot(details, driver_id, None)?;
        }

        let candidate = ConflictCandidate::at(slot.datetime)
            .vehicle(vehicle_id)
            .driver(driver_id);
        self.detector
            .ensure_not_blocked(&mut *tx, slot.group_id, &candidate, Some(slot.id))
            .await?;

        let assignment = tx
            .insert_vehicle_assignment(NewVehicleAssignment {
                slot_id: slot.id,
                vehicle_id,
                driver_id,
                seat_override,
            })
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation { .. } => vehicle_already_assigned(vehicle_id, slot.id),
                other => other.into(),
            })?;
        Ok(assignment)
    }

    async fn within_timeout<T, F>(&self, operation: &str, transaction: F) -> SlotResult<T>
    where
        F: Future<Output = SlotResult<T>>,
    {
        let deadline = Instant::now() + self.settings.transaction_timeout;
        self.within_deadline(operation, deadline, transaction).await
    }

    async fn within_deadline<T, F>(
        &self,
        operation: &str,
        deadline: Instant,
        transaction: F,
    ) -> SlotResult<T>
    where
        F: Future<Output = SlotResult<T>>,
    {
        let result = match tokio::time::timeout_at(deadline, transaction).await {
            Ok(result) => result,
            Err(_) => Err(SlotError::Transient(format!(
                "{} did not complete within {}ms",
                operation,
                self.settings.transaction_timeout.as_millis()
            ))),
        };

        if let Err(err) = &result {
            warn!("{} aborted: {}", operation, err);
        }
        result
    }

    async fn visible_slot(&self, caller_id: Uuid, slot_id: Uuid) -> SlotResult<SlotDetails> {
        let mut reader = self.store.reader().await?;
        let details = load_slot(&mut reader, slot_id).await?;
        self.access.require_slot(caller_id, &details).await?;
        Ok(details)
    }

    async fn require_vehicle(&self, caller_id: Uuid, vehicle_id: Uuid) -> SlotResult<Vehicle> {
        let vehicle = self
            .directory
            .vehicle(vehicle_id)
            .await?
            .ok_or_else(|| vehicle_not_found(vehicle_id))?;
        self.access
            .require_family(caller_id, FamilyResource::Vehicle(vehicle_id))
            .await?;
        Ok(vehicle)
    }

    async fn require_child(&self, caller_id: Uuid, child_id: Uuid) -> SlotResult<Child> {
        let child = self
            .directory
            .child(child_id)
            .await?
            .ok_or_else(|| child_not_found(child_id))?;
        self.access
            .require_family(caller_id, FamilyResource::Child(child_id))
            .await?;
        Ok(child)
    }

    async fn require_driver(&self, driver_id: Option<Uuid>) -> SlotResult<()> {
        let Some(driver_id) = driver_id else {
            return Ok(());
        };
        match self.directory.user(driver_id).await? {
            Some(_) => Ok(()),
            None => Err(driver_not_found(driver_id)),
        }
    }
}

/// A driver can only drive one vehicle per slot.
fn ensure_driver_free_in_slot(
    details: &SlotDetails,
    driver_id: Uuid,
    except_assignment: Option<Uuid>,
) -> SlotResult<()> {
    let Some(existing) = details
        .vehicles
        .iter()
        .find(|va| va.driver_id == Some(driver_id) && Some(va.id) != except_assignment)
    else {
        return Ok(());
    };

    Err(SlotError::double_booking(vec![Conflict::new(
        ConflictType::DriverDoubleBooking,
        details.slot.id,
        driver_id,
        format!(
            "Driver {} is already driving vehicle {} in slot {}",
            driver_id, existing.vehicle_id, details.slot.id
        ),
    )]))
}

fn vehicle_already_assigned(vehicle_id: Uuid, slot_id: Uuid) -> SlotError {
    SlotError::Duplicate(format!(
        "Vehicle {} is already assigned to slot {}",
        vehicle_id, slot_id
    ))
}

fn child_already_assigned(child_id: Uuid, slot_id: Uuid) -> SlotError {
    SlotError::Duplicate(format!(
        "Child {} is already assigned to slot {}",
        child_id, slot_id
    ))
}

fn vehicle_assignment_not_found(id: Uuid) -> SlotError {
    SlotError::NotFound(format!("Vehicle assignment {} not found", id))
}
