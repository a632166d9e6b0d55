//! Seat capacity arithmetic for vehicle assignments.
//!
//! Everything here is pure: callers feed in the assignment's seat override,
//! the vehicle's base capacity and the child assignments read from the store.

use uuid::Uuid;

use crate::errors::{SlotError, SlotResult};
use crate::models::slot::ChildAssignment;

/// Upper bound for any seat override.
pub const MAX_CAPACITY: i32 = 10;

pub fn effective_capacity(seat_override: Option<i32>, base_capacity: i32) -> i32 {
    seat_override.unwrap_or(base_capacity)
}

pub fn occupancy(vehicle_assignment_id: Uuid, children: &[ChildAssignment]) -> usize {
    children
        .iter()
        .filter(|ca| ca.vehicle_assignment_id == vehicle_assignment_id)
        .count()
}

pub fn available_seats(effective_capacity: i32, occupancy: usize) -> i32 {
    (effective_capacity - occupancy as i32).max(0)
}

pub fn has_free_seat(effective_capacity: i32, occupancy: usize) -> bool {
    (occupancy as i32) < effective_capacity
}

/// Out-of-range overrides fail validation; they are never clamped.
pub fn validate_seat_override(seat_override: Option<i32>) -> SlotResult<()> {
    match seat_override {
        Some(seats) if !(0..=MAX_CAPACITY).contains(&seats) => Err(SlotError::Validation(format!(
            "Seat override {} is out of range (0..={})",
            seats, MAX_CAPACITY
        ))),
        _ => Ok(()),
    }
}
