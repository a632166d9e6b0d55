use axum::{
    Router,
    routing::{delete, get, post, put},
};
use carpool_core::store::SlotStore;
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes<S: SlotStore>() -> Router<Arc<ApiState<S>>> {
    Router::new()
        .route("/api/slots", post(handlers::slots::create_slot::<S>))
        .route("/api/slots/:slot_id", get(handlers::slots::get_slot::<S>))
        .route(
            "/api/slots/:slot_id/vehicles",
            post(handlers::slots::assign_vehicle::<S>),
        )
        .route(
            "/api/slots/:slot_id/vehicles/:vehicle_id",
            delete(handlers::slots::remove_vehicle::<S>),
        )
        .route(
            "/api/slots/:slot_id/vehicles/:vehicle_id/driver",
            put(handlers::slots::update_driver::<S>),
        )
        .route(
            "/api/vehicle-assignments/:id/seat-override",
            put(handlers::slots::update_seat_override::<S>),
        )
        .route(
            "/api/slots/:slot_id/children",
            post(handlers::slots::assign_child::<S>),
        )
        .route(
            "/api/slots/:slot_id/children/:child_id",
            delete(handlers::slots::remove_child::<S>),
        )
        .route(
            "/api/slots/:slot_id/conflicts",
            get(handlers::slots::get_conflicts::<S>),
        )
        .route(
            "/api/slots/:slot_id/available-children",
            get(handlers::slots::get_available_children::<S>),
        )
}
