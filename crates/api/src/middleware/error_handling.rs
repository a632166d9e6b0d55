//! # Error Handling Middleware
//!
//! Maps [`SlotError`] values to HTTP status codes and JSON error bodies of the
//! form `{"error": message, "code": code}`. Double bookings also carry the
//! blocking conflicts under `"conflicts"`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use carpool_core::errors::SlotError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// Handlers return `Result<_, AppError>` and use `?` on engine calls; the
/// `From` impls below do the wrapping.
#[derive(Debug)]
pub struct AppError(pub SlotError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SlotError::NotFound(_) => StatusCode::NOT_FOUND,
            SlotError::Validation(_) => StatusCode::BAD_REQUEST,
            SlotError::Capacity(_) => StatusCode::CONFLICT,
            SlotError::Duplicate(_) => StatusCode::CONFLICT,
            SlotError::DoubleBooking { .. } => StatusCode::CONFLICT,
            SlotError::Transient(_) | SlotError::SerializationFailure(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SlotError::Authentication(_) => StatusCode::UNAUTHORIZED,
            SlotError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();

        let body = match &self.0 {
            SlotError::DoubleBooking { conflicts, .. } => json!({
                "error": self.0.to_string(),
                "code": code,
                "conflicts": conflicts,
            }),
            SlotError::Database(report) => {
                // Store internals stay in the log.
                error!("Internal error: {:?}", report);
                json!({ "error": "Internal server error", "code": code })
            }
            other => json!({ "error": other.to_string(), "code": code }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(SlotError::Database(err))
    }
}

/// Maps a SlotError straight to an HTTP response
pub fn map_error(err: SlotError) -> Response {
    AppError(err).into_response()
}
