//! Persistence seam for slots and their assignments.
//!
//! The engine never talks to a database directly. It reads through [`SlotReads`]
//! and mutates only inside a [`SlotTransaction`] obtained from
//! [`SlotStore::begin_serializable`]. Implementations must give that transaction
//! true serializable isolation: every capacity and uniqueness decision the engine
//! makes inside it relies on that guarantee.
//!
//! Dropping a transaction without calling [`SlotTransaction::commit`] must roll it
//! back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::slot::{
    ChildAssignment, NewVehicleAssignment, ScheduleSlot, SlotDetails, VehicleAssignment,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unique constraint violation ({})", constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },

    #[error("serialization failure: {0}")]
    Serialization(String),

    #[error("store timeout: {0}")]
    Timeout(String),

    #[error(transparent)]
    Other(#[from] eyre::Report),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait SlotReads: Send {
    async fn slot(&mut self, slot_id: Uuid) -> StoreResult<Option<SlotDetails>>;

    async fn slot_at(
        &mut self,
        group_id: Uuid,
        datetime: DateTime<Utc>,
    ) -> StoreResult<Option<SlotDetails>>;

    /// Slots at exactly `datetime`, optionally restricted to one group.
    async fn slots_at_instant(
        &mut self,
        datetime: DateTime<Utc>,
        group_id: Option<Uuid>,
        exclude_slot_id: Option<Uuid>,
    ) -> StoreResult<Vec<SlotDetails>>;

    /// Slots of a group within `[start, end)`, ordered by datetime.
    async fn slots_in_range(
        &mut self,
        group_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<SlotDetails>>;

    async fn vehicle_assignment(
        &mut self,
        vehicle_assignment_id: Uuid,
    ) -> StoreResult<Option<VehicleAssignment>>;
}

#[async_trait]
pub trait SlotTransaction: SlotReads {
    /// Fails with [`StoreError::UniqueViolation`] when `(group_id, datetime)` is taken.
    async fn insert_slot(
        &mut self,
        group_id: Uuid,
        datetime: DateTime<Utc>,
    ) -> StoreResult<ScheduleSlot>;

    /// Deletes the slot and everything it owns.
    async fn delete_slot(&mut self, slot_id: Uuid) -> StoreResult<()>;

    async fn insert_vehicle_assignment(
        &mut self,
        assignment: NewVehicleAssignment,
    ) -> StoreResult<VehicleAssignment>;

    async fn update_vehicle_assignment(
        &mut self,
        vehicle_assignment_id: Uuid,
        driver_id: Option<Uuid>,
        seat_override: Option<i32>,
    ) -> StoreResult<VehicleAssignment>;

    /// Deletes the assignment and its child assignments.
    async fn delete_vehicle_assignment(&mut self, vehicle_assignment_id: Uuid) -> StoreResult<()>;

    async fn insert_child_assignment(
        &mut self,
        slot_id: Uuid,
        vehicle_assignment_id: Uuid,
        child_id: Uuid,
    ) -> StoreResult<ChildAssignment>;

    async fn delete_child_assignment(&mut self, child_assignment_id: Uuid) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>;
}

#[async_trait]
pub trait SlotStore: Send + Sync + 'static {
    type Reader: SlotReads;
    type Tx: SlotTransaction;

    /// A read handle with the store's default consistency.
    async fn reader(&self) -> StoreResult<Self::Reader>;

    async fn begin_serializable(&self) -> StoreResult<Self::Tx>;
}
