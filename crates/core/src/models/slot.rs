use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capacity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: Uuid,
    pub group_id: Uuid,
    pub datetime: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleAssignment {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub seat_override: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildAssignment {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub vehicle_assignment_id: Uuid,
    pub child_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVehicleAssignment {
    pub slot_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub seat_override: Option<i32>,
}

/// A slot together with every assignment row it owns, as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDetails {
    pub slot: ScheduleSlot,
    pub vehicles: Vec<VehicleAssignment>,
    pub children: Vec<ChildAssignment>,
}

impl SlotDetails {
    pub fn vehicle_assignment(&self, id: Uuid) -> Option<&VehicleAssignment> {
        self.vehicles.iter().find(|va| va.id == id)
    }

    pub fn assignment_for_vehicle(&self, vehicle_id: Uuid) -> Option<&VehicleAssignment> {
        self.vehicles.iter().find(|va| va.vehicle_id == vehicle_id)
    }

    pub fn child_assignment(&self, child_id: Uuid) -> Option<&ChildAssignment> {
        self.children.iter().find(|ca| ca.child_id == child_id)
    }

    /// Number of children riding in the given vehicle assignment.
    pub fn occupancy(&self, vehicle_assignment_id: Uuid) -> usize {
        capacity::occupancy(vehicle_assignment_id, &self.children)
    }

    pub fn children_of(&self, vehicle_assignment_id: Uuid) -> Vec<ChildAssignment> {
        self.children
            .iter()
            .filter(|ca| ca.vehicle_assignment_id == vehicle_assignment_id)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleAssignmentView {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub vehicle_name: Option<String>,
    pub driver_id: Option<Uuid>,
    pub seat_override: Option<i32>,
    pub base_capacity: i32,
    pub effective_capacity: i32,
    pub occupancy: i32,
    pub available_seats: i32,
    pub children: Vec<ChildAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: Uuid,
    pub group_id: Uuid,
    pub datetime: DateTime<Utc>,
    pub vehicles: Vec<VehicleAssignmentView>,
}

impl SlotView {
    pub fn total_available_seats(&self) -> i32 {
        self.vehicles.iter().map(|v| v.available_seats).sum()
    }
}
