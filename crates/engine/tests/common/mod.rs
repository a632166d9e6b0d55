#![allow(dead_code)]

use std::sync::Arc;

use carpool_core::collaborators::Collaborators;
use carpool_core::models::assignment::CreateSlotRequest;
use carpool_core::models::directory::{Child, GroupScheduleConfig, User, Vehicle};
use carpool_db::mock::{MemoryDirectory, MemoryStore};
use carpool_engine::{EngineSettings, SlotEngine};
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use uuid::Uuid;

pub const CHILD_COUNT: usize = 8;

/// The first Monday at 08:00 UTC that is at least a week away.
pub fn next_monday_0800() -> DateTime<Utc> {
    let today = Utc::now().date_naive();
    let days_ahead = 7 + (7 - today.weekday().num_days_from_monday()) % 7;
    (today + Duration::days(days_ahead as i64))
        .and_hms_opt(8, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn schedule(group_id: Uuid) -> GroupScheduleConfig {
    GroupScheduleConfig::new(group_id).with_hours(Weekday::Mon, &["08:00", "16:00"])
}

pub fn user(family_id: Uuid, timezone: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: FirstName().fake(),
        timezone: timezone.to_string(),
        family_id: Some(family_id),
    }
}

pub fn vehicle(family_id: Uuid, capacity: i32) -> Vehicle {
    Vehicle {
        id: Uuid::new_v4(),
        name: format!("{}'s van", LastName().fake::<String>()),
        capacity,
        family_id,
    }
}

pub fn child(family_id: Uuid) -> Child {
    Child {
        id: Uuid::new_v4(),
        name: FirstName().fake(),
        family_id,
        group_ids: vec![],
    }
}

/// One family in one group, with a caller, a spare driver, two vehicles and
/// a handful of children. A second group shares the same family.
pub struct World {
    pub group_id: Uuid,
    pub other_group_id: Uuid,
    pub family_id: Uuid,
    pub caller: User,
    pub driver: User,
    /// Four seats.
    pub van: Vehicle,
    /// Two seats.
    pub car: Vehicle,
    pub children: Vec<Child>,
    pub directory: MemoryDirectory,
    pub slot_time: DateTime<Utc>,
}

impl World {
    pub fn new() -> Self {
        Self::with_timezone("UTC")
    }

    pub fn with_timezone(timezone: &str) -> Self {
        let group_id = Uuid::new_v4();
        let other_group_id = Uuid::new_v4();
        let family_id = Uuid::new_v4();
        let caller = user(family_id, timezone);
        let driver = user(family_id, timezone);
        let van = vehicle(family_id, 4);
        let car = vehicle(family_id, 2);
        let children: Vec<Child> = (0..CHILD_COUNT).map(|_| child(family_id)).collect();

        let mut directory = MemoryDirectory::new()
            .with_group_family(group_id, family_id)
            .with_group_family(other_group_id, family_id)
            .with_schedule(schedule(group_id))
            .with_schedule(schedule(other_group_id))
            .with_user(caller.clone())
            .with_user(driver.clone())
            .with_vehicle(van.clone())
            .with_vehicle(car.clone());
        for c in &children {
            directory = directory.with_child(c.clone());
        }

        Self {
            group_id,
            other_group_id,
            family_id,
            caller,
            driver,
            van,
            car,
            children,
            directory,
            slot_time: next_monday_0800(),
        }
    }

    pub fn engine(&self) -> (MemoryStore, SlotEngine<MemoryStore>) {
        self.engine_with(EngineSettings::default())
    }

    pub fn engine_with(&self, settings: EngineSettings) -> (MemoryStore, SlotEngine<MemoryStore>) {
        let store = MemoryStore::new();
        let collaborators = Collaborators::from_shared(Arc::new(self.directory.clone()));
        let engine = SlotEngine::new(Arc::new(store.clone()), collaborators, settings);
        (store, engine)
    }

    pub fn create_request(&self, vehicle: &Vehicle) -> CreateSlotRequest {
        CreateSlotRequest {
            group_id: self.group_id,
            datetime: self.slot_time,
            vehicle_id: vehicle.id,
            driver_id: None,
            seat_override: None,
        }
    }
}
