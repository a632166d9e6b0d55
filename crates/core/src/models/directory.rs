use std::collections::BTreeMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub family_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: Uuid,
    pub name: String,
    pub family_id: Uuid,
    pub group_ids: Vec<Uuid>,
}

impl Child {
    pub fn belongs_to_group(&self, group_id: Uuid) -> bool {
        self.group_ids.contains(&group_id)
    }
}

/// A person known to the directory: a driver, a parent, or any other caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// IANA timezone name, e.g. `Europe/Paris`.
    pub timezone: String,
    pub family_id: Option<Uuid>,
}

/// Resources whose family membership the access policy can vouch for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FamilyResource {
    Child(Uuid),
    Vehicle(Uuid),
}

/// Permitted departure times for a group, keyed by upper-case weekday name.
/// Times are `HH:MM` strings expressed in UTC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupScheduleConfig {
    pub group_id: Uuid,
    pub hours: BTreeMap<String, Vec<String>>,
}

impl GroupScheduleConfig {
    pub fn new(group_id: Uuid) -> Self {
        Self {
            group_id,
            hours: BTreeMap::new(),
        }
    }

    pub fn with_hours(mut self, weekday: Weekday, times: &[&str]) -> Self {
        self.hours
            .entry(weekday_key(weekday).to_string())
            .or_default()
            .extend(times.iter().map(|t| t.to_string()));
        self
    }

    pub fn times_for(&self, weekday: Weekday) -> &[String] {
        self.hours
            .get(weekday_key(weekday))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}
