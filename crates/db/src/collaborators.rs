use async_trait::async_trait;
use carpool_core::collaborators::{AccessPolicy, Directory, ScheduleConfigSource};
use carpool_core::models::directory::{Child, FamilyResource, GroupScheduleConfig, User, Vehicle};
use eyre::Result;
use uuid::Uuid;

use crate::DbPool;
use crate::repositories::{directory, schedule_config};

/// Reads the family/group directory tables to answer collaborator queries.
///
/// A caller has slot access when their family belongs to the slot's group, and
/// is a family member of a child or vehicle when they share its family.
#[derive(Clone)]
pub struct PgDirectory {
    pool: DbPool,
}

impl PgDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessPolicy for PgDirectory {
    async fn caller_has_slot_access(&self, caller_id: Uuid, group_id: Uuid) -> Result<bool> {
        directory::is_user_in_group(&self.pool, caller_id, group_id).await
    }

    async fn caller_is_family_member(
        &self,
        caller_id: Uuid,
        resource: FamilyResource,
    ) -> Result<bool> {
        match resource {
            FamilyResource::Child(child_id) => {
                directory::is_user_in_family_of_child(&self.pool, caller_id, child_id).await
            }
            FamilyResource::Vehicle(vehicle_id) => {
                directory::is_user_in_family_of_vehicle(&self.pool, caller_id, vehicle_id).await
            }
        }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn vehicle(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>> {
        let vehicle = directory::get_vehicle_by_id(&self.pool, vehicle_id).await?;
        Ok(vehicle.map(Into::into))
    }

    async fn child(&self, child_id: Uuid) -> Result<Option<Child>> {
        let child = directory::get_child_by_id(&self.pool, child_id).await?;
        Ok(child.map(Into::into))
    }

    async fn user(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = directory::get_user_by_id(&self.pool, user_id).await?;
        Ok(user.map(Into::into))
    }

    async fn group_children(&self, group_id: Uuid) -> Result<Vec<Child>> {
        let children = directory::get_children_by_group(&self.pool, group_id).await?;
        Ok(children.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ScheduleConfigSource for PgDirectory {
    async fn schedule_config(&self, group_id: Uuid) -> Result<Option<GroupScheduleConfig>> {
        let rows = schedule_config::get_schedule_hours_by_group(&self.pool, group_id).await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut config = GroupScheduleConfig::new(group_id);
        for row in rows {
            config.hours.entry(row.weekday).or_default().push(row.time_of_day);
        }
        Ok(Some(config))
    }
}
