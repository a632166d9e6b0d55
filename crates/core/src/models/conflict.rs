use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    VehicleOverbooking,
    VehicleDoubleBooking,
    DriverDoubleBooking,
    ChildDoubleBooking,
    FamilyDoubleBooking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A detected overbooking or double-booking. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Severity,
    /// Blocking conflicts abort the mutation; the rest are advisory.
    pub blocking: bool,
    /// The slot in which the conflicting commitment lives.
    pub slot_id: Uuid,
    /// The vehicle, driver or child that is overcommitted.
    pub resource_id: Uuid,
    pub message: String,
}

impl Conflict {
    pub fn new(
        conflict_type: ConflictType,
        slot_id: Uuid,
        resource_id: Uuid,
        message: impl Into<String>,
    ) -> Self {
        let (severity, blocking) = match conflict_type {
            ConflictType::VehicleOverbooking => (Severity::Critical, true),
            ConflictType::VehicleDoubleBooking
            | ConflictType::DriverDoubleBooking
            | ConflictType::ChildDoubleBooking => (Severity::High, true),
            ConflictType::FamilyDoubleBooking => (Severity::Medium, false),
        };
        Self {
            conflict_type,
            severity,
            blocking,
            slot_id,
            resource_id,
            message: message.into(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
