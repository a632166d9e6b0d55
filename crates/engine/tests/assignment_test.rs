mod common;

use carpool_core::errors::SlotError;
use carpool_core::models::assignment::{AssignVehicleRequest, CreateSlotRequest};
use carpool_core::models::conflict::ConflictType;
use carpool_engine::{ConflictScope, EngineSettings};
use chrono::Duration;
use common::World;
use pretty_assertions::assert_eq;
use rstest::rstest;
use uuid::Uuid;

#[test_log::test(tokio::test)]
async fn test_four_seat_scenario() {
    let world = World::new();
    let (store, engine) = world.engine();

    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();
    assert_eq!(view.vehicles.len(), 1);
    assert_eq!(view.vehicles[0].effective_capacity, 4);
    let va_id = view.vehicles[0].id;

    for child in &world.children[..4] {
        engine
            .assignments
            .assign_child(world.caller.id, view.id, child.id, va_id)
            .await
            .unwrap();
    }

    let err = engine
        .assignments
        .assign_child(world.caller.id, view.id, world.children[4].id, va_id)
        .await
        .unwrap_err();
    match err {
        SlotError::Capacity(message) => assert!(message.contains("(4/4)"), "{message}"),
        other => panic!("expected a capacity conflict, got {other:?}"),
    }

    let removed = engine
        .assignments
        .remove_vehicle(world.caller.id, view.id, world.van.id)
        .await
        .unwrap();
    assert!(removed.slot_deleted);
    assert!(store.snapshot().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_seat_override_below_occupancy_is_rejected() {
    let world = World::new();
    let (store, engine) = world.engine();

    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();
    let va_id = view.vehicles[0].id;
    for child in &world.children[..3] {
        engine
            .assignments
            .assign_child(world.caller.id, view.id, child.id, va_id)
            .await
            .unwrap();
    }

    let err = engine
        .assignments
        .update_seat_override(world.caller.id, va_id, Some(2))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::Capacity(_)), "{err:?}");

    let slots = store.snapshot().await;
    assert_eq!(slots[0].children.len(), 3);
    assert_eq!(slots[0].vehicles[0].seat_override, None);

    let updated = engine
        .assignments
        .update_seat_override(world.caller.id, va_id, Some(3))
        .await
        .unwrap();
    assert_eq!(updated.seat_override, Some(3));

    let cleared = engine
        .assignments
        .update_seat_override(world.caller.id, va_id, None)
        .await
        .unwrap();
    assert_eq!(cleared.seat_override, None);
}

#[rstest]
#[case(-1)]
#[case(11)]
#[tokio::test]
async fn test_seat_override_out_of_range_is_a_validation_error(#[case] seats: i32) {
    let world = World::new();
    let (store, engine) = world.engine();

    let request = CreateSlotRequest {
        seat_override: Some(seats),
        ..world.create_request(&world.van)
    };
    let err = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, request)
        .await
        .unwrap_err();

    assert!(matches!(err, SlotError::Validation(_)), "{err:?}");
    assert!(store.snapshot().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_same_vehicle_twice_in_a_slot_is_rejected() {
    let world = World::new();
    let (store, engine) = world.engine();

    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();

    let err = engine
        .assignments
        .assign_vehicle(
            world.caller.id,
            view.id,
            AssignVehicleRequest {
                vehicle_id: world.van.id,
                driver_id: None,
                seat_override: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::Duplicate(_)), "{err:?}");

    let err = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::Duplicate(_)), "{err:?}");

    let slots = store.snapshot().await;
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].vehicles.len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_same_child_twice_in_a_slot_is_rejected() {
    let world = World::new();
    let (_store, engine) = world.engine();

    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();
    let car = engine
        .assignments
        .assign_vehicle(
            world.caller.id,
            view.id,
            AssignVehicleRequest {
                vehicle_id: world.car.id,
                driver_id: None,
                seat_override: None,
            },
        )
        .await
        .unwrap();
    let child = world.children[0].id;

    engine
        .assignments
        .assign_child(world.caller.id, view.id, child, view.vehicles[0].id)
        .await
        .unwrap();
    let err = engine
        .assignments
        .assign_child(world.caller.id, view.id, child, car.id)
        .await
        .unwrap_err();

    assert!(matches!(err, SlotError::Duplicate(_)), "{err:?}");
}

#[test_log::test(tokio::test)]
async fn test_second_create_attaches_to_existing_slot() {
    let world = World::new();
    let (store, engine) = world.engine();

    let first = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();
    let second = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.car))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.vehicles.len(), 2);
    assert_eq!(store.snapshot().await.len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_slot_is_deleted_with_its_last_vehicle() {
    let world = World::new();
    let (store, engine) = world.engine();

    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();
    let car = engine
        .assignments
        .assign_vehicle(
            world.caller.id,
            view.id,
            AssignVehicleRequest {
                vehicle_id: world.car.id,
                driver_id: None,
                seat_override: None,
            },
        )
        .await
        .unwrap();
    engine
        .assignments
        .assign_child(world.caller.id, view.id, world.children[0].id, car.id)
        .await
        .unwrap();

    let removed = engine
        .assignments
        .remove_vehicle(world.caller.id, view.id, world.car.id)
        .await
        .unwrap();
    assert!(!removed.slot_deleted);
    let slots = store.snapshot().await;
    assert_eq!(slots[0].vehicles.len(), 1);
    assert!(slots[0].children.is_empty());

    let removed = engine
        .assignments
        .remove_vehicle(world.caller.id, view.id, world.van.id)
        .await
        .unwrap();
    assert!(removed.slot_deleted);
    assert!(store.snapshot().await.is_empty());

    let err = engine
        .assignments
        .remove_vehicle(world.caller.id, view.id, world.van.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NotFound(_)));
}

#[test_log::test(tokio::test)]
async fn test_remove_child_frees_the_seat() {
    let world = World::new();
    let (_store, engine) = world.engine();

    let request = CreateSlotRequest {
        seat_override: Some(1),
        ..world.create_request(&world.van)
    };
    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, request)
        .await
        .unwrap();
    let va_id = view.vehicles[0].id;
    let (first, second) = (world.children[0].id, world.children[1].id);

    engine
        .assignments
        .assign_child(world.caller.id, view.id, first, va_id)
        .await
        .unwrap();
    assert!(engine
        .assignments
        .assign_child(world.caller.id, view.id, second, va_id)
        .await
        .is_err());

    engine
        .assignments
        .remove_child(world.caller.id, view.id, first)
        .await
        .unwrap();
    engine
        .assignments
        .assign_child(world.caller.id, view.id, second, va_id)
        .await
        .unwrap();

    let err = engine
        .assignments
        .remove_child(world.caller.id, view.id, first)
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NotFound(_)));
}

#[rstest]
#[case(Duration::hours(1))]
#[case(Duration::days(1))]
#[case(Duration::minutes(30))]
#[tokio::test]
async fn test_unconfigured_time_is_rejected(#[case] offset: Duration) {
    let world = World::new();
    let (store, engine) = world.engine();

    let request = CreateSlotRequest {
        datetime: world.slot_time + offset,
        ..world.create_request(&world.van)
    };
    let err = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, request)
        .await
        .unwrap_err();

    assert!(matches!(err, SlotError::Validation(_)), "{err:?}");
    assert!(store.snapshot().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_past_slot_is_rejected() {
    let world = World::new();
    let (_store, engine) = world.engine();

    let request = CreateSlotRequest {
        datetime: world.slot_time - Duration::weeks(5),
        ..world.create_request(&world.van)
    };
    let err = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, request)
        .await
        .unwrap_err();

    match err {
        SlotError::Validation(message) => assert!(message.contains("in the past"), "{message}"),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_caller_with_unknown_timezone_is_rejected() {
    let world = World::with_timezone("Mars/Olympus_Mons");
    let (_store, engine) = world.engine();

    let err = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap_err();

    assert!(matches!(err, SlotError::Validation(ref m) if m.contains("Mars/Olympus_Mons")));
}

#[test_log::test(tokio::test)]
async fn test_driver_cannot_drive_two_vehicles_in_one_slot() {
    let world = World::new();
    let (_store, engine) = world.engine();

    let request = CreateSlotRequest {
        driver_id: Some(world.driver.id),
        ..world.create_request(&world.van)
    };
    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, request)
        .await
        .unwrap();

    let err = engine
        .assignments
        .assign_vehicle(
            world.caller.id,
            view.id,
            AssignVehicleRequest {
                vehicle_id: world.car.id,
                driver_id: Some(world.driver.id),
                seat_override: None,
            },
        )
        .await
        .unwrap_err();

    match err {
        SlotError::DoubleBooking { conflicts, .. } => {
            assert_eq!(conflicts[0].conflict_type, ConflictType::DriverDoubleBooking);
        }
        other => panic!("expected a double booking, got {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_driver_double_booking_across_groups_is_blocked() {
    let world = World::new();
    let (store, engine) = world.engine();

    engine
        .assignments
        .create_slot_with_vehicle(
            world.caller.id,
            CreateSlotRequest {
                driver_id: Some(world.driver.id),
                ..world.create_request(&world.van)
            },
        )
        .await
        .unwrap();

    let err = engine
        .assignments
        .create_slot_with_vehicle(
            world.caller.id,
            CreateSlotRequest {
                group_id: world.other_group_id,
                driver_id: Some(world.driver.id),
                ..world.create_request(&world.car)
            },
        )
        .await
        .unwrap_err();

    match err {
        SlotError::DoubleBooking { conflicts, .. } => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].conflict_type, ConflictType::DriverDoubleBooking);
            assert_eq!(conflicts[0].resource_id, world.driver.id);
        }
        other => panic!("expected a double booking, got {other:?}"),
    }
    assert_eq!(store.snapshot().await.len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_vehicle_double_booking_across_groups_is_blocked() {
    let world = World::new();
    let (_store, engine) = world.engine();

    engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();

    let err = engine
        .assignments
        .create_slot_with_vehicle(
            world.caller.id,
            CreateSlotRequest {
                group_id: world.other_group_id,
                ..world.create_request(&world.van)
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SlotError::DoubleBooking { ref conflicts, .. }
            if conflicts[0].conflict_type == ConflictType::VehicleDoubleBooking
    ));
}

#[test_log::test(tokio::test)]
async fn test_child_double_booking_across_groups_is_blocked() {
    let world = World::new();
    let (_store, engine) = world.engine();
    let child = world.children[0].id;

    let first = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();
    engine
        .assignments
        .assign_child(world.caller.id, first.id, child, first.vehicles[0].id)
        .await
        .unwrap();

    let second = engine
        .assignments
        .create_slot_with_vehicle(
            world.caller.id,
            CreateSlotRequest {
                group_id: world.other_group_id,
                ..world.create_request(&world.car)
            },
        )
        .await
        .unwrap();
    let err = engine
        .assignments
        .assign_child(world.caller.id, second.id, child, second.vehicles[0].id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SlotError::DoubleBooking { ref conflicts, .. }
            if conflicts[0].conflict_type == ConflictType::ChildDoubleBooking
    ));
}

#[test_log::test(tokio::test)]
async fn test_group_scope_ignores_other_groups() {
    let world = World::new();
    let settings = EngineSettings {
        conflict_scope: ConflictScope::Group,
        ..EngineSettings::default()
    };
    let (store, engine) = world.engine_with(settings);

    for group_id in [world.group_id, world.other_group_id] {
        engine
            .assignments
            .create_slot_with_vehicle(
                world.caller.id,
                CreateSlotRequest {
                    group_id,
                    driver_id: Some(world.driver.id),
                    ..world.create_request(&world.van)
                },
            )
            .await
            .unwrap();
    }

    assert_eq!(store.snapshot().await.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_family_conflicts_do_not_block() {
    let world = World::new();
    let (store, engine) = world.engine();

    engine
        .assignments
        .create_slot_with_vehicle(
            world.caller.id,
            CreateSlotRequest {
                driver_id: Some(world.driver.id),
                ..world.create_request(&world.van)
            },
        )
        .await
        .unwrap();

    // The caller shares the driver's family.
    engine
        .assignments
        .create_slot_with_vehicle(
            world.caller.id,
            CreateSlotRequest {
                group_id: world.other_group_id,
                driver_id: Some(world.caller.id),
                ..world.create_request(&world.car)
            },
        )
        .await
        .unwrap();

    assert_eq!(store.snapshot().await.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_update_driver() {
    let world = World::new();
    let (_store, engine) = world.engine();

    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();

    let updated = engine
        .assignments
        .update_driver(world.caller.id, view.id, world.van.id, Some(world.driver.id))
        .await
        .unwrap();
    assert_eq!(updated.driver_id, Some(world.driver.id));

    let cleared = engine
        .assignments
        .update_driver(world.caller.id, view.id, world.van.id, None)
        .await
        .unwrap();
    assert_eq!(cleared.driver_id, None);

    let err = engine
        .assignments
        .update_driver(world.caller.id, view.id, world.van.id, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NotFound(_)));

    let err = engine
        .assignments
        .update_driver(world.caller.id, view.id, world.car.id, Some(world.driver.id))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NotFound(_)));
}

#[test_log::test(tokio::test)]
async fn test_unknown_resources_are_not_found() {
    let world = World::new();
    let (_store, engine) = world.engine();

    let err = engine
        .assignments
        .create_slot_with_vehicle(
            world.caller.id,
            CreateSlotRequest {
                vehicle_id: Uuid::new_v4(),
                ..world.create_request(&world.van)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NotFound(_)));

    let view = engine
        .assignments
        .create_slot_with_vehicle(world.caller.id, world.create_request(&world.van))
        .await
        .unwrap();

    let err = engine
        .assignments
        .assign_child(world.caller.id, view.id, Uuid::new_v4(), view.vehicles[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NotFound(_)));

    let err = engine
        .assignments
        .assign_child(world.caller.id, view.id, world.children[0].id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NotFound(_)));

    let err = engine
        .assignments
        .update_seat_override(world.caller.id, Uuid::new_v4(), Some(2))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NotFound(_)));
}
