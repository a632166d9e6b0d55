use carpool_core::models::{
    directory::{Child, User, Vehicle},
    slot::{ChildAssignment, ScheduleSlot, VehicleAssignment},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbScheduleSlot {
    pub id: Uuid,
    pub group_id: Uuid,
    pub datetime: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbVehicleAssignment {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub seat_override: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbChildAssignment {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub vehicle_assignment_id: Uuid,
    pub child_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbVehicle {
    pub id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub family_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbChild {
    pub id: Uuid,
    pub name: String,
    pub family_id: Uuid,
    pub group_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    pub family_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbScheduleHour {
    pub group_id: Uuid,
    pub weekday: String,
    pub time_of_day: String,
}

impl From<DbScheduleSlot> for ScheduleSlot {
    fn from(row: DbScheduleSlot) -> Self {
        Self {
            id: row.id,
            group_id: row.group_id,
            datetime: row.datetime,
            created_at: row.created_at,
        }
    }
}

impl From<DbVehicleAssignment> for VehicleAssignment {
    fn from(row: DbVehicleAssignment) -> Self {
        Self {
            id: row.id,
            slot_id: row.slot_id,
            vehicle_id: row.vehicle_id,
            driver_id: row.driver_id,
            seat_override: row.seat_override,
            created_at: row.created_at,
        }
    }
}

impl From<DbChildAssignment> for ChildAssignment {
    fn from(row: DbChildAssignment) -> Self {
        Self {
            id: row.id,
            slot_id: row.slot_id,
            vehicle_assignment_id: row.vehicle_assignment_id,
            child_id: row.child_id,
            created_at: row.created_at,
        }
    }
}

impl From<DbVehicle> for Vehicle {
    fn from(row: DbVehicle) -> Self {
        Self {
            id: row.id,
            name: row.name,
            capacity: row.capacity,
            family_id: row.family_id,
        }
    }
}

impl From<DbChild> for Child {
    fn from(row: DbChild) -> Self {
        Self {
            id: row.id,
            name: row.name,
            family_id: row.family_id,
            group_ids: row.group_ids,
        }
    }
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        Self {
            id: row.id,
            name: row.name,
            timezone: row.timezone,
            family_id: row.family_id,
        }
    }
}
