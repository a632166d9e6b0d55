use std::collections::HashMap;

use carpool_core::capacity;
use carpool_core::collaborators::Directory;
use carpool_core::errors::SlotResult;
use carpool_core::models::directory::Vehicle;
use carpool_core::models::slot::{SlotDetails, SlotView, VehicleAssignmentView};
use uuid::Uuid;

/// Looks up every vehicle assigned in `details`. Vehicles unknown to the
/// directory are left out.
pub async fn vehicles_of(
    directory: &dyn Directory,
    details: &SlotDetails,
) -> SlotResult<HashMap<Uuid, Vehicle>> {
    let mut vehicles = HashMap::new();
    for va in &details.vehicles {
        if vehicles.contains_key(&va.vehicle_id) {
            continue;
        }
        if let Some(vehicle) = directory.vehicle(va.vehicle_id).await? {
            vehicles.insert(va.vehicle_id, vehicle);
        }
    }
    Ok(vehicles)
}

pub fn base_capacities(vehicles: &HashMap<Uuid, Vehicle>) -> HashMap<Uuid, i32> {
    vehicles.iter().map(|(id, v)| (*id, v.capacity)).collect()
}

pub fn slot_view(details: &SlotDetails, vehicles: &HashMap<Uuid, Vehicle>) -> SlotView {
    let assignments = details
        .vehicles
        .iter()
        .map(|va| {
            let vehicle = vehicles.get(&va.vehicle_id);
            let base_capacity = vehicle.map(|v| v.capacity).unwrap_or(0);
            let effective_capacity = capacity::effective_capacity(va.seat_override, base_capacity);
            let occupancy = details.occupancy(va.id);

            VehicleAssignmentView {
                id: va.id,
                vehicle_id: va.vehicle_id,
                vehicle_name: vehicle.map(|v| v.name.clone()),
                driver_id: va.driver_id,
                seat_override: va.seat_override,
                base_capacity,
                effective_capacity,
                occupancy: occupancy as i32,
                available_seats: capacity::available_seats(effective_capacity, occupancy),
                children: details.children_of(va.id),
            }
        })
        .collect();

    SlotView {
        id: details.slot.id,
        group_id: details.slot.group_id,
        datetime: details.slot.datetime,
        vehicles: assignments,
    }
}

pub async fn build_slot_view(
    directory: &dyn Directory,
    details: &SlotDetails,
) -> SlotResult<SlotView> {
    let vehicles = vehicles_of(directory, details).await?;
    Ok(slot_view(details, &vehicles))
}
