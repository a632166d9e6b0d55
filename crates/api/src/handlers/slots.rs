use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use carpool_core::{
    models::{
        assignment::{
            AssignChildRequest, AssignVehicleRequest, AvailableChild, CreateSlotRequest,
            RemoveVehicleResponse, UpdateDriverRequest, UpdateSeatOverrideRequest,
        },
        conflict::Conflict,
        slot::{ChildAssignment, SlotView, VehicleAssignment},
    },
    store::SlotStore,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::Caller, error_handling::AppError},
};

pub async fn create_slot<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Json(payload): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<SlotView>), AppError> {
    let view = state
        .engine
        .assignments
        .create_slot_with_vehicle(caller, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_slot<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<SlotView>, AppError> {
    let view = state.engine.queries.get_slot(caller, slot_id).await?;
    Ok(Json(view))
}

pub async fn assign_vehicle<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path(slot_id): Path<Uuid>,
    Json(payload): Json<AssignVehicleRequest>,
) -> Result<(StatusCode, Json<VehicleAssignment>), AppError> {
    let assignment = state
        .engine
        .assignments
        .assign_vehicle(caller, slot_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn remove_vehicle<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path((slot_id, vehicle_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RemoveVehicleResponse>, AppError> {
    let response = state
        .engine
        .assignments
        .remove_vehicle(caller, slot_id, vehicle_id)
        .await?;

    Ok(Json(response))
}

pub async fn update_driver<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path((slot_id, vehicle_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDriverRequest>,
) -> Result<Json<VehicleAssignment>, AppError> {
    let assignment = state
        .engine
        .assignments
        .update_driver(caller, slot_id, vehicle_id, payload.driver_id)
        .await?;

    Ok(Json(assignment))
}

pub async fn update_seat_override<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path(vehicle_assignment_id): Path<Uuid>,
    Json(payload): Json<UpdateSeatOverrideRequest>,
) -> Result<Json<VehicleAssignment>, AppError> {
    let assignment = state
        .engine
        .assignments
        .update_seat_override(caller, vehicle_assignment_id, payload.seat_override)
        .await?;

    Ok(Json(assignment))
}

pub async fn assign_child<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path(slot_id): Path<Uuid>,
    Json(payload): Json<AssignChildRequest>,
) -> Result<(StatusCode, Json<ChildAssignment>), AppError> {
    let assignment = state
        .engine
        .assignments
        .assign_child(
            caller,
            slot_id,
            payload.child_id,
            payload.vehicle_assignment_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn remove_child<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path((slot_id, child_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .engine
        .assignments
        .remove_child(caller, slot_id, child_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_conflicts<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Vec<Conflict>>, AppError> {
    let conflicts = state.engine.queries.get_conflicts(caller, slot_id).await?;
    Ok(Json(conflicts))
}

pub async fn get_available_children<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Vec<AvailableChild>>, AppError> {
    let children = state
        .engine
        .queries
        .get_available_children(caller, slot_id)
        .await?;

    Ok(Json(children))
}
