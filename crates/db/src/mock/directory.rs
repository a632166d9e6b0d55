use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use carpool_core::collaborators::{AccessPolicy, Directory, ScheduleConfigSource};
use carpool_core::models::directory::{Child, FamilyResource, GroupScheduleConfig, User, Vehicle};
use eyre::Result;
use uuid::Uuid;

/// Directory, access policy and schedule configuration held in memory.
///
/// Access follows family membership: a user may act on a group's slots when
/// their family belongs to the group, and on a child or vehicle of their own
/// family. A child's `group_ids` are derived from its family's groups.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    users: HashMap<Uuid, User>,
    vehicles: HashMap<Uuid, Vehicle>,
    children: HashMap<Uuid, Child>,
    group_families: HashMap<Uuid, HashSet<Uuid>>,
    schedules: HashMap<Uuid, GroupScheduleConfig>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group_family(mut self, group_id: Uuid, family_id: Uuid) -> Self {
        self.group_families
            .entry(group_id)
            .or_default()
            .insert(family_id);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.id, user);
        self
    }

    pub fn with_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicles.insert(vehicle.id, vehicle);
        self
    }

    pub fn with_child(mut self, child: Child) -> Self {
        self.children.insert(child.id, child);
        self
    }

    pub fn with_schedule(mut self, config: GroupScheduleConfig) -> Self {
        self.schedules.insert(config.group_id, config);
        self
    }

    fn groups_of_family(&self, family_id: Uuid) -> Vec<Uuid> {
        let mut groups: Vec<Uuid> = self
            .group_families
            .iter()
            .filter(|(_, families)| families.contains(&family_id))
            .map(|(group, _)| *group)
            .collect();
        groups.sort();
        groups
    }

    fn with_groups(&self, child: &Child) -> Child {
        Child {
            group_ids: self.groups_of_family(child.family_id),
            ..child.clone()
        }
    }

    fn family_of_user(&self, user_id: Uuid) -> Option<Uuid> {
        self.users.get(&user_id).and_then(|u| u.family_id)
    }
}

#[async_trait]
impl AccessPolicy for MemoryDirectory {
    async fn caller_has_slot_access(&self, caller_id: Uuid, group_id: Uuid) -> Result<bool> {
        let Some(family_id) = self.family_of_user(caller_id) else {
            return Ok(false);
        };
        Ok(self
            .group_families
            .get(&group_id)
            .is_some_and(|families| families.contains(&family_id)))
    }

    async fn caller_is_family_member(
        &self,
        caller_id: Uuid,
        resource: FamilyResource,
    ) -> Result<bool> {
        let Some(family_id) = self.family_of_user(caller_id) else {
            return Ok(false);
        };
        let owner = match resource {
            FamilyResource::Child(id) => self.children.get(&id).map(|c| c.family_id),
            FamilyResource::Vehicle(id) => self.vehicles.get(&id).map(|v| v.family_id),
        };
        Ok(owner == Some(family_id))
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn vehicle(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>> {
        Ok(self.vehicles.get(&vehicle_id).cloned())
    }

    async fn child(&self, child_id: Uuid) -> Result<Option<Child>> {
        Ok(self.children.get(&child_id).map(|c| self.with_groups(c)))
    }

    async fn user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&user_id).cloned())
    }

    async fn group_children(&self, group_id: Uuid) -> Result<Vec<Child>> {
        let Some(families) = self.group_families.get(&group_id) else {
            return Ok(vec![]);
        };
        let mut children: Vec<Child> = self
            .children
            .values()
            .filter(|c| families.contains(&c.family_id))
            .map(|c| self.with_groups(c))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

#[async_trait]
impl ScheduleConfigSource for MemoryDirectory {
    async fn schedule_config(&self, group_id: Uuid) -> Result<Option<GroupScheduleConfig>> {
        Ok(self.schedules.get(&group_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_child_groups_follow_family_membership() {
        let family = Uuid::new_v4();
        let group = Uuid::new_v4();
        let child = Child {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            family_id: family,
            group_ids: vec![],
        };
        let directory = MemoryDirectory::new()
            .with_group_family(group, family)
            .with_child(child.clone());

        let found = directory.child(child.id).await.unwrap().unwrap();
        assert_eq!(found.group_ids, vec![group]);
        assert_eq!(directory.group_children(group).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_access_requires_family_in_group() {
        let family = Uuid::new_v4();
        let group = Uuid::new_v4();
        let user = User {
            id: Uuid::new_v4(),
            name: "Grace".to_string(),
            timezone: "UTC".to_string(),
            family_id: Some(family),
        };
        let directory = MemoryDirectory::new().with_user(user.clone());

        assert!(!directory.caller_has_slot_access(user.id, group).await.unwrap());

        let directory = directory.with_group_family(group, family);
        assert!(directory.caller_has_slot_access(user.id, group).await.unwrap());
    }
}
