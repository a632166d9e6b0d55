use axum::{
    Json,
    extract::{Path, Query, State},
};
use carpool_core::{
    models::{assignment::ScheduleQuery, slot::SlotView},
    store::SlotStore,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::Caller, error_handling::AppError},
};

/// `GET /api/groups/:group_id/schedule?start=&end=`, both bounds RFC 3339 and optional.
pub async fn get_schedule<S: SlotStore>(
    State(state): State<Arc<ApiState<S>>>,
    Caller(caller): Caller,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<SlotView>>, AppError> {
    let slots = state
        .engine
        .queries
        .get_schedule(caller, group_id, query)
        .await?;

    Ok(Json(slots))
}
