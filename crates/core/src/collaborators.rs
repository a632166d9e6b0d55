//! Interfaces to the systems this core consumes but does not own.
//!
//! Authorization, the family/vehicle/child directory and group schedule
//! configuration are managed elsewhere. The engine trusts what these traits
//! return and never re-derives it.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use uuid::Uuid;

use crate::models::directory::{Child, FamilyResource, GroupScheduleConfig, User, Vehicle};

#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn caller_has_slot_access(&self, caller_id: Uuid, group_id: Uuid) -> Result<bool>;

    async fn caller_is_family_member(
        &self,
        caller_id: Uuid,
        resource: FamilyResource,
    ) -> Result<bool>;
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn vehicle(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>>;

    async fn child(&self, child_id: Uuid) -> Result<Option<Child>>;

    async fn user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Children of every family that is a member of the group.
    async fn group_children(&self, group_id: Uuid) -> Result<Vec<Child>>;
}

#[async_trait]
pub trait ScheduleConfigSource: Send + Sync {
    async fn schedule_config(&self, group_id: Uuid) -> Result<Option<GroupScheduleConfig>>;
}

/// Handles to every collaborator, passed to engine components at construction.
#[derive(Clone)]
pub struct Collaborators {
    pub access: Arc<dyn AccessPolicy>,
    pub directory: Arc<dyn Directory>,
    pub schedule_config: Arc<dyn ScheduleConfigSource>,
}

impl Collaborators {
    pub fn new(
        access: Arc<dyn AccessPolicy>,
        directory: Arc<dyn Directory>,
        schedule_config: Arc<dyn ScheduleConfigSource>,
    ) -> Self {
        Self {
            access,
            directory,
            schedule_config,
        }
    }

    /// Uses one value for all three roles, which is how the database-backed
    /// and in-memory implementations are shaped.
    pub fn from_shared<T>(shared: Arc<T>) -> Self
    where
        T: AccessPolicy + Directory + ScheduleConfigSource + 'static,
    {
        Self {
            access: shared.clone(),
            directory: shared.clone(),
            schedule_config: shared,
        }
    }
}
