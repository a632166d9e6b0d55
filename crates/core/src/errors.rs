use thiserror::Error;

use crate::models::conflict::Conflict;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Capacity conflict: {0}")]
    Capacity(String),

    #[error("Already assigned: {0}")]
    Duplicate(String),

    #[error("Double booking: {message}")]
    DoubleBooking {
        message: String,
        conflicts: Vec<Conflict>,
    },

    #[error("Transient store error: {0}")]
    Transient(String),

    /// The store aborted the transaction to keep concurrent writers
    /// serializable. Transient like [`SlotError::Transient`], but kept apart
    /// so a lost slot-creation race can be told from a timeout.
    #[error("Transient store error: {0}")]
    SerializationFailure(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

impl SlotError {
    /// Stable machine-readable code surfaced to callers next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            SlotError::NotFound(_) => "NOT_FOUND",
            SlotError::Validation(_) => "VALIDATION_ERROR",
            SlotError::Capacity(_) => "CAPACITY_EXCEEDED",
            SlotError::Duplicate(_) => "ALREADY_ASSIGNED",
            SlotError::DoubleBooking { .. } => "DOUBLE_BOOKED",
            SlotError::Transient(_) | SlotError::SerializationFailure(_) => "TRANSIENT_STORE_ERROR",
            SlotError::Authentication(_) => "UNAUTHENTICATED",
            SlotError::Database(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may reasonably retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SlotError::Transient(_) | SlotError::SerializationFailure(_)
        )
    }

    pub fn double_booking(conflicts: Vec<Conflict>) -> Self {
        let message = conflicts
            .iter()
            .map(|c| c.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        SlotError::DoubleBooking { message, conflicts }
    }
}

impl From<StoreError> for SlotError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => SlotError::Duplicate(format!(
                "unique constraint {} violated",
                constraint.as_deref().unwrap_or("<unknown>")
            )),
            StoreError::Serialization(msg) => SlotError::SerializationFailure(msg),
            StoreError::Timeout(msg) => SlotError::Transient(msg),
            StoreError::Other(report) => SlotError::Database(report),
        }
    }
}

pub type SlotResult<T> = Result<T, SlotError>;
