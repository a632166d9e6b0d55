use chrono::{TimeZone, Utc, Weekday};
use pretty_assertions::assert_eq;
use serde_json::{from_str, json, to_string, to_value};
use serde_test::{Token, assert_tokens};
use carpool_core::models::{
    assignment::{AvailableChild, CreateSlotRequest, RemoveVehicleResponse},
    conflict::{Conflict, ConflictType, Severity},
    directory::{FamilyResource, GroupScheduleConfig},
    slot::{ChildAssignment, ScheduleSlot, SlotDetails, VehicleAssignment},
};
use uuid::Uuid;

fn sample_slot() -> SlotDetails {
    let slot_id = Uuid::new_v4();
    let va_id = Uuid::new_v4();
    let now = Utc::now();
    SlotDetails {
        slot: ScheduleSlot {
            id: slot_id,
            group_id: Uuid::new_v4(),
            datetime: Utc.with_ymd_and_hms(2030, 1, 7, 8, 0, 0).unwrap(),
            created_at: now,
        },
        vehicles: vec![VehicleAssignment {
            id: va_id,
            slot_id,
            vehicle_id: Uuid::new_v4(),
            driver_id: None,
            seat_override: Some(3),
            created_at: now,
        }],
        children: (0..2)
            .map(|_| ChildAssignment {
                id: Uuid::new_v4(),
                slot_id,
                vehicle_assignment_id: va_id,
                child_id: Uuid::new_v4(),
                created_at: now,
            })
            .collect(),
    }
}

#[test]
fn test_slot_details_serialization() {
    let details = sample_slot();

    let json = to_string(&details).expect("Failed to serialize slot");
    let deserialized: SlotDetails = from_str(&json).expect("Failed to deserialize slot");

    assert_eq!(deserialized, details);
}

#[test]
fn test_slot_details_lookups() {
    let details = sample_slot();
    let va = details.vehicles[0].clone();

    assert_eq!(details.occupancy(va.id), 2);
    assert_eq!(details.vehicle_assignment(va.id), Some(&va));
    assert_eq!(details.assignment_for_vehicle(va.vehicle_id), Some(&va));
    assert!(details.assignment_for_vehicle(Uuid::new_v4()).is_none());
    assert_eq!(details.children_of(va.id).len(), 2);
    assert!(details.child_assignment(details.children[1].child_id).is_some());
}

#[test]
fn test_conflict_type_tokens() {
    assert_tokens(
        &ConflictType::DriverDoubleBooking,
        &[Token::UnitVariant {
            name: "ConflictType",
            variant: "DRIVER_DOUBLE_BOOKING",
        }],
    );
    assert_tokens(
        &Severity::Critical,
        &[Token::UnitVariant {
            name: "Severity",
            variant: "CRITICAL",
        }],
    );
}

#[test]
fn test_conflict_json_shape() {
    let slot_id = Uuid::new_v4();
    let vehicle_id = Uuid::new_v4();
    let conflict = Conflict::new(
        ConflictType::VehicleOverbooking,
        slot_id,
        vehicle_id,
        "Vehicle is over capacity (5/4)",
    );

    let value = to_value(&conflict).unwrap();

    assert_eq!(
        value,
        json!({
            "type": "VEHICLE_OVERBOOKING",
            "severity": "CRITICAL",
            "blocking": true,
            "slot_id": slot_id,
            "resource_id": vehicle_id,
            "message": "Vehicle is over capacity (5/4)",
        })
    );
}

#[test]
fn test_family_conflicts_are_advisory() {
    let conflict = Conflict::new(
        ConflictType::FamilyDoubleBooking,
        Uuid::new_v4(),
        Uuid::new_v4(),
        "sibling elsewhere",
    );

    assert!(!conflict.blocking);
    assert_eq!(conflict.severity, Severity::Medium);
    assert!(Severity::Low < Severity::Critical);
}

#[test]
fn test_family_resource_serialization() {
    let id = Uuid::new_v4();
    let value = to_value(FamilyResource::Vehicle(id)).unwrap();

    assert_eq!(value, json!({ "kind": "vehicle", "id": id }));
}

#[test]
fn test_schedule_config_lookup() {
    let group_id = Uuid::new_v4();
    let config = GroupScheduleConfig::new(group_id)
        .with_hours(Weekday::Mon, &["08:00", "15:30"])
        .with_hours(Weekday::Fri, &["08:00"]);

    assert_eq!(config.times_for(Weekday::Mon), ["08:00", "15:30"]);
    assert_eq!(config.times_for(Weekday::Fri), ["08:00"]);
    assert!(config.times_for(Weekday::Sun).is_empty());

    let json = to_value(&config).unwrap();
    assert_eq!(json["hours"]["MONDAY"], json!(["08:00", "15:30"]));
}

#[test]
fn test_create_slot_request_optional_fields() {
    let group_id = Uuid::new_v4();
    let vehicle_id = Uuid::new_v4();
    let body = json!({
        "group_id": group_id,
        "datetime": "2030-01-07T08:00:00Z",
        "vehicle_id": vehicle_id,
    });

    let request: CreateSlotRequest = serde_json::from_value(body).unwrap();

    assert_eq!(request.group_id, group_id);
    assert_eq!(
        request.datetime,
        Utc.with_ymd_and_hms(2030, 1, 7, 8, 0, 0).unwrap()
    );
    assert!(request.driver_id.is_none());
    assert!(request.seat_override.is_none());
}

#[test]
fn test_response_serialization() {
    let response = RemoveVehicleResponse { slot_deleted: true };
    assert_eq!(to_value(&response).unwrap(), json!({ "slot_deleted": true }));

    let child = AvailableChild {
        child_id: Uuid::new_v4(),
        name: "Ada".to_string(),
        family_id: Uuid::new_v4(),
        can_assign: false,
        conflict_reason: Some("No seats available".to_string()),
    };
    let roundtrip: AvailableChild = from_str(&to_string(&child).unwrap()).unwrap();
    assert_eq!(roundtrip, child);
}
