use async_trait::async_trait;
use carpool_core::collaborators::{AccessPolicy, Directory, ScheduleConfigSource};
use carpool_core::models::directory::{Child, FamilyResource, GroupScheduleConfig, User, Vehicle};
use mockall::mock;
use uuid::Uuid;

// Mock collaborators for testing
mock! {
    pub AccessPolicy {}

    #[async_trait]
    impl AccessPolicy for AccessPolicy {
        async fn caller_has_slot_access(&self, caller_id: Uuid, group_id: Uuid) -> eyre::Result<bool>;

        async fn caller_is_family_member(
            &self,
            caller_id: Uuid,
            resource: FamilyResource,
        ) -> eyre::Result<bool>;
    }
}

mock! {
    pub Directory {}

    #[async_trait]
    impl Directory for Directory {
        async fn vehicle(&self, vehicle_id: Uuid) -> eyre::Result<Option<Vehicle>>;

        async fn child(&self, child_id: Uuid) -> eyre::Result<Option<Child>>;

        async fn user(&self, user_id: Uuid) -> eyre::Result<Option<User>>;

        async fn group_children(&self, group_id: Uuid) -> eyre::Result<Vec<Child>>;
    }
}

mock! {
    pub ScheduleConfigSource {}

    #[async_trait]
    impl ScheduleConfigSource for ScheduleConfigSource {
        async fn schedule_config(&self, group_id: Uuid) -> eyre::Result<Option<GroupScheduleConfig>>;
    }
}
