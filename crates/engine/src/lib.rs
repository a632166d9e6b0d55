//! Slot assignment and conflict engine.
//!
//! [`AssignmentManager`] owns every mutation and runs each one inside a
//! serializable store transaction; [`SlotQueryService`] answers reads. Both are
//! built from the same store handle and collaborators.

pub mod access;
pub mod assignment;
pub mod conflict;
pub mod query;
pub mod settings;
pub mod timing;
pub mod view;

use std::sync::Arc;

use carpool_core::collaborators::Collaborators;
use carpool_core::store::SlotStore;

pub use assignment::AssignmentManager;
pub use query::SlotQueryService;
pub use settings::{ConflictScope, EngineSettings};

pub struct SlotEngine<S: SlotStore> {
    pub assignments: AssignmentManager<S>,
    pub queries: SlotQueryService<S>,
}

impl<S: SlotStore> SlotEngine<S> {
    pub fn new(store: Arc<S>, collaborators: Collaborators, settings: EngineSettings) -> Self {
        Self {
            assignments: AssignmentManager::new(store.clone(), collaborators.clone(), settings),
            queries: SlotQueryService::new(store, collaborators, settings),
        }
    }
}
