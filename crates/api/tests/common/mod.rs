#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use carpool_api::{ApiState, build_router, middleware::auth::CALLER_HEADER};
use carpool_core::collaborators::Collaborators;
use carpool_core::models::directory::{Child, GroupScheduleConfig, User, Vehicle};
use carpool_db::mock::{MemoryDirectory, MemoryStore};
use carpool_engine::{EngineSettings, SlotEngine};
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use serde_json::{Value, json};
use uuid::Uuid;

/// The first Monday at 08:00 UTC that is at least a week away.
pub fn next_monday_0800() -> DateTime<Utc> {
    let today = Utc::now().date_naive();
    let days_ahead = 7 + (7 - today.weekday().num_days_from_monday()) % 7;
    (today + Duration::days(days_ahead as i64))
        .and_hms_opt(8, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn caller_header(caller: Uuid) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(CALLER_HEADER),
        HeaderValue::from_str(&caller.to_string()).unwrap(),
    )
}

/// Serves the router from an in-memory store. One family with a three-seat
/// minivan and four children, all in one group scheduled Mondays at 08:00.
pub struct TestApp {
    pub server: TestServer,
    pub store: MemoryStore,
    pub group_id: Uuid,
    pub caller: Uuid,
    pub minivan: Vehicle,
    pub children: Vec<Child>,
    pub slot_time: DateTime<Utc>,
}

impl TestApp {
    pub fn new() -> Self {
        let group_id = Uuid::new_v4();
        let family_id = Uuid::new_v4();
        let caller = User {
            id: Uuid::new_v4(),
            name: "Robin".to_string(),
            timezone: "UTC".to_string(),
            family_id: Some(family_id),
        };
        let minivan = Vehicle {
            id: Uuid::new_v4(),
            name: "Minivan".to_string(),
            capacity: 3,
            family_id,
        };
        let children: Vec<Child> = ["Ada", "Bo", "Cy", "Di"]
            .iter()
            .map(|name| Child {
                id: Uuid::new_v4(),
                name: name.to_string(),
                family_id,
                group_ids: vec![],
            })
            .collect();

        let mut directory = MemoryDirectory::new()
            .with_group_family(group_id, family_id)
            .with_schedule(GroupScheduleConfig::new(group_id).with_hours(Weekday::Mon, &["08:00"]))
            .with_user(caller.clone())
            .with_vehicle(minivan.clone());
        for child in &children {
            directory = directory.with_child(child.clone());
        }

        let store = MemoryStore::new();
        let engine = SlotEngine::new(
            Arc::new(store.clone()),
            Collaborators::from_shared(Arc::new(directory)),
            EngineSettings::default(),
        );
        Self::serve(engine, store, group_id, caller.id, minivan, children)
    }

    pub fn serve(
        engine: SlotEngine<MemoryStore>,
        store: MemoryStore,
        group_id: Uuid,
        caller: Uuid,
        minivan: Vehicle,
        children: Vec<Child>,
    ) -> Self {
        let router = build_router(Arc::new(ApiState { engine }));
        Self {
            server: TestServer::new(router).unwrap(),
            store,
            group_id,
            caller,
            minivan,
            children,
            slot_time: next_monday_0800(),
        }
    }

    pub fn as_caller(&self, request: TestRequest) -> TestRequest {
        let (name, value) = caller_header(self.caller);
        request.add_header(name, value)
    }

    pub fn create_body(&self) -> Value {
        json!({
            "group_id": self.group_id,
            "datetime": self.slot_time,
            "vehicle_id": self.minivan.id,
            "driver_id": null,
            "seat_override": null,
        })
    }

    /// Creates the Monday slot with the minivan and returns the slot view.
    pub async fn create_slot(&self) -> Value {
        let response = self
            .as_caller(self.server.post("/api/slots"))
            .json(&self.create_body())
            .await;
        response.json::<Value>()
    }
}
