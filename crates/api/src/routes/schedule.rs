use axum::{Router, routing::get};
use carpool_core::store::SlotStore;
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes<S: SlotStore>() -> Router<Arc<ApiState<S>>> {
    Router::new().route(
        "/api/groups/:group_id/schedule",
        get(handlers::schedule::get_schedule::<S>),
    )
}
