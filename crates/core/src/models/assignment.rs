use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    pub group_id: Uuid,
    pub datetime: DateTime<Utc>,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub seat_override: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignVehicleRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub seat_override: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDriverRequest {
    pub driver_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSeatOverrideRequest {
    pub seat_override: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignChildRequest {
    pub child_id: Uuid,
    pub vehicle_assignment_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveVehicleResponse {
    pub slot_deleted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableChild {
    pub child_id: Uuid,
    pub name: String,
    pub family_id: Uuid,
    pub can_assign: bool,
    pub conflict_reason: Option<String>,
}
