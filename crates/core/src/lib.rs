//! # Carpool Core
//!
//! Domain types and pure rules for carpool schedule slots: seat capacity,
//! timezone-aware timing checks and conflict classification. Also defines the
//! traits through which the engine reaches its store and collaborators.

pub mod capacity;
pub mod collaborators;
pub mod conflict;
pub mod errors;
pub mod models;
pub mod store;
pub mod timing;
