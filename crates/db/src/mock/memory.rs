//! In-memory [`SlotStore`] with serializable semantics.
//!
//! A transaction owns the store's mutex until it is committed or dropped, and
//! mutates a private working copy that is published only on commit. Readers take
//! a snapshot of the last committed state.

use std::sync::Arc;

use async_trait::async_trait;
use carpool_core::models::slot::{
    ChildAssignment, NewVehicleAssignment, ScheduleSlot, SlotDetails, VehicleAssignment,
};
use carpool_core::store::{SlotReads, SlotStore, SlotTransaction, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use eyre::eyre;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

const SLOT_KEY: &str = "schedule_slots_group_datetime_key";
const VEHICLE_KEY: &str = "vehicle_assignments_slot_vehicle_key";
const CHILD_KEY: &str = "child_assignments_slot_child_key";

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    slots: Vec<ScheduleSlot>,
    vehicles: Vec<VehicleAssignment>,
    children: Vec<ChildAssignment>,
    // Slots another writer commits just before a matching insert_slot runs.
    racing: Vec<SlotDetails>,
}

impl MemoryState {
    fn details(&self, slot: &ScheduleSlot) -> SlotDetails {
        SlotDetails {
            slot: slot.clone(),
            vehicles: self
                .vehicles
                .iter()
                .filter(|va| va.slot_id == slot.id)
                .cloned()
                .collect(),
            children: self
                .children
                .iter()
                .filter(|ca| ca.slot_id == slot.id)
                .cloned()
                .collect(),
        }
    }

    fn find_slot(&self, slot_id: Uuid) -> Option<SlotDetails> {
        self.slots
            .iter()
            .find(|s| s.id == slot_id)
            .map(|s| self.details(s))
    }

    fn find_slot_at(&self, group_id: Uuid, datetime: DateTime<Utc>) -> Option<SlotDetails> {
        self.slots
            .iter()
            .find(|s| s.group_id == group_id && s.datetime == datetime)
            .map(|s| self.details(s))
    }

    fn at_instant(
        &self,
        datetime: DateTime<Utc>,
        group_id: Option<Uuid>,
        exclude_slot_id: Option<Uuid>,
    ) -> Vec<SlotDetails> {
        self.slots
            .iter()
            .filter(|s| s.datetime == datetime)
            .filter(|s| group_id.is_none_or(|g| s.group_id == g))
            .filter(|s| exclude_slot_id != Some(s.id))
            .map(|s| self.details(s))
            .collect()
    }

    fn in_range(
        &self,
        group_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<SlotDetails> {
        let mut slots: Vec<&ScheduleSlot> = self
            .slots
            .iter()
            .filter(|s| s.group_id == group_id)
            .filter(|s| start.is_none_or(|start| s.datetime >= start))
            .filter(|s| end.is_none_or(|end| s.datetime < end))
            .collect();
        slots.sort_by_key(|s| s.datetime);
        slots.into_iter().map(|s| self.details(s)).collect()
    }

    fn find_vehicle_assignment(&self, id: Uuid) -> Option<VehicleAssignment> {
        self.vehicles.iter().find(|va| va.id == id).cloned()
    }

    fn insert_details(&mut self, details: SlotDetails) {
        self.slots.push(details.slot);
        self.vehicles.extend(details.vehicles);
        self.children.extend(details.children);
    }

    fn all(&self) -> Vec<SlotDetails> {
        let mut slots: Vec<SlotDetails> = self.slots.iter().map(|s| self.details(s)).collect();
        slots.sort_by_key(|d| d.slot.datetime);
        slots
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts committed data directly, bypassing every check.
    pub async fn seed(&self, details: SlotDetails) {
        self.state.lock().await.insert_details(details);
    }

    /// Every committed slot, ordered by datetime.
    pub async fn snapshot(&self) -> Vec<SlotDetails> {
        self.state.lock().await.all()
    }

    /// Simulates a concurrent writer the way PostgreSQL reports it under
    /// serializable isolation: the next transaction that creates a slot for the
    /// same `(group_id, datetime)` fails at commit with a serialization
    /// failure, after `details` has been committed by the other writer.
    pub async fn race_slot_creation(&self, details: SlotDetails) {
        self.state.lock().await.racing.push(details);
    }

    /// Holds the store lock, stalling every transaction until the guard drops.
    pub async fn stall(&self) -> OwnedMutexGuard<MemoryState> {
        self.state.clone().lock_owned().await
    }
}

pub struct MemoryReader {
    snapshot: MemoryState,
}

pub struct MemoryTransaction {
    committed: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl SlotStore for MemoryStore {
    type Reader = MemoryReader;
    type Tx = MemoryTransaction;

    async fn reader(&self) -> StoreResult<MemoryReader> {
        let snapshot = self.state.lock().await.clone();
        Ok(MemoryReader { snapshot })
    }

    async fn begin_serializable(&self) -> StoreResult<MemoryTransaction> {
        let committed = self.state.clone().lock_owned().await;
        let working = committed.clone();
        Ok(MemoryTransaction { committed, working })
    }
}

macro_rules! impl_memory_reads {
    ($ty:ty, $field:ident) => {
        #[async_trait]
        impl SlotReads for $ty {
            async fn slot(&mut self, slot_id: Uuid) -> StoreResult<Option<SlotDetails>> {
                Ok(self.$field.find_slot(slot_id))
            }

            async fn slot_at(
                &mut self,
                group_id: Uuid,
                datetime: DateTime<Utc>,
            ) -> StoreResult<Option<SlotDetails>> {
                Ok(self.$field.find_slot_at(group_id, datetime))
            }

            async fn slots_at_instant(
                &mut self,
                datetime: DateTime<Utc>,
                group_id: Option<Uuid>,
                exclude_slot_id: Option<Uuid>,
            ) -> StoreResult<Vec<SlotDetails>> {
                Ok(self.$field.at_instant(datetime, group_id, exclude_slot_id))
            }

            async fn slots_in_range(
                &mut self,
                group_id: Uuid,
                start: Option<DateTime<Utc>>,
                end: Option<DateTime<Utc>>,
            ) -> StoreResult<Vec<SlotDetails>> {
                Ok(self.$field.in_range(group_id, start, end))
            }

            async fn vehicle_assignment(
                &mut self,
                vehicle_assignment_id: Uuid,
            ) -> StoreResult<Option<VehicleAssignment>> {
                Ok(self.$field.find_vehicle_assignment(vehicle_assignment_id))
            }
        }
    };
}

impl_memory_reads!(MemoryReader, snapshot);
impl_memory_reads!(MemoryTransaction, working);

fn unique_violation(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: Some(constraint.to_string()),
    }
}

#[async_trait]
impl SlotTransaction for MemoryTransaction {
    async fn insert_slot(
        &mut self,
        group_id: Uuid,
        datetime: DateTime<Utc>,
    ) -> StoreResult<ScheduleSlot> {
        if self.working.find_slot_at(group_id, datetime).is_some() {
            return Err(unique_violation(SLOT_KEY));
        }

        let slot = ScheduleSlot {
            id: Uuid::new_v4(),
            group_id,
            datetime,
            created_at: Utc::now(),
        };
        self.working.slots.push(slot.clone());
        Ok(slot)
    }

    async fn delete_slot(&mut self, slot_id: Uuid) -> StoreResult<()> {
        self.working.slots.retain(|s| s.id != slot_id);
        self.working.vehicles.retain(|va| va.slot_id != slot_id);
        self.working.children.retain(|ca| ca.slot_id != slot_id);
        Ok(())
    }

    async fn insert_vehicle_assignment(
        &mut self,
        assignment: NewVehicleAssignment,
    ) -> StoreResult<VehicleAssignment> {
        if !self.working.slots.iter().any(|s| s.id == assignment.slot_id) {
            return Err(eyre!("Slot {} does not exist", assignment.slot_id).into());
        }
        if let Some(seats) = assignment.seat_override
            && !(0..=10).contains(&seats)
        {
            return Err(eyre!("seat_override {} violates check constraint", seats).into());
        }
        if self
            .working
            .vehicles
            .iter()
            .any(|va| va.slot_id == assignment.slot_id && va.vehicle_id == assignment.vehicle_id)
        {
            return Err(unique_violation(VEHICLE_KEY));
        }

        let created = VehicleAssignment {
            id: Uuid::new_v4(),
            slot_id: assignment.slot_id,
            vehicle_id: assignment.vehicle_id,
            driver_id: assignment.driver_id,
            seat_override: assignment.seat_override,
            created_at: Utc::now(),
        };
        self.working.vehicles.push(created.clone());
        Ok(created)
    }

    async fn update_vehicle_assignment(
        &mut self,
        vehicle_assignment_id: Uuid,
        driver_id: Option<Uuid>,
        seat_override: Option<i32>,
    ) -> StoreResult<VehicleAssignment> {
        let assignment = self
            .working
            .vehicles
            .iter_mut()
            .find(|va| va.id == vehicle_assignment_id)
            .ok_or_else(|| eyre!("Vehicle assignment {} does not exist", vehicle_assignment_id))?;
        assignment.driver_id = driver_id;
        assignment.seat_override = seat_override;
        Ok(assignment.clone())
    }

    async fn delete_vehicle_assignment(&mut self, vehicle_assignment_id: Uuid) -> StoreResult<()> {
        self.working.vehicles.retain(|va| va.id != vehicle_assignment_id);
        self.working
            .children
            .retain(|ca| ca.vehicle_assignment_id != vehicle_assignment_id);
        Ok(())
    }

    async fn insert_child_assignment(
        &mut self,
        slot_id: Uuid,
        vehicle_assignment_id: Uuid,
        child_id: Uuid,
    ) -> StoreResult<ChildAssignment> {
        if !self
            .working
            .vehicles
            .iter()
            .any(|va| va.id == vehicle_assignment_id && va.slot_id == slot_id)
        {
            return Err(eyre!(
                "Vehicle assignment {} does not belong to slot {}",
                vehicle_assignment_id,
                slot_id
            )
            .into());
        }
        if self
            .working
            .children
            .iter()
            .any(|ca| ca.slot_id == slot_id && ca.child_id == child_id)
        {
            return Err(unique_violation(CHILD_KEY));
        }

        let created = ChildAssignment {
            id: Uuid::new_v4(),
            slot_id,
            vehicle_assignment_id,
            child_id,
            created_at: Utc::now(),
        };
        self.working.children.push(created.clone());
        Ok(created)
    }

    async fn delete_child_assignment(&mut self, child_assignment_id: Uuid) -> StoreResult<()> {
        self.working.children.retain(|ca| ca.id != child_assignment_id);
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        let MemoryTransaction {
            mut committed,
            working,
        } = self;

        let lost = committed.racing.iter().position(|d| {
            let key = (d.slot.group_id, d.slot.datetime);
            working.find_slot_at(key.0, key.1).is_some()
                && committed.find_slot_at(key.0, key.1).is_none()
        });
        if let Some(index) = lost {
            let winner = committed.racing.remove(index);
            committed.insert_details(winner);
            return Err(StoreError::Serialization(
                "could not serialize access due to read/write dependencies among transactions"
                    .to_string(),
            ));
        }

        // Keep races queued by the test harness; they are not transactional data.
        let racing = std::mem::take(&mut committed.racing);
        *committed = working;
        committed.racing = racing;
        Ok(())
    }
}
