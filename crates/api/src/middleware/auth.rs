//! # Caller Identity
//!
//! Authentication happens upstream of this service. The authenticating proxy
//! forwards the caller's user id in the `x-caller-id` header; handlers take a
//! [`Caller`] argument to require it.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use carpool_core::errors::SlotError;
use uuid::Uuid;

use super::error_handling::AppError;

pub const CALLER_HEADER: &str = "x-caller-id";

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(CALLER_HEADER).ok_or_else(|| {
            AppError(SlotError::Authentication(format!(
                "Missing {} header",
                CALLER_HEADER
            )))
        })?;

        value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(Caller)
            .ok_or_else(|| {
                AppError(SlotError::Authentication(format!(
                    "Malformed {} header",
                    CALLER_HEADER
                )))
            })
    }
}
