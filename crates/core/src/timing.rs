//! Timezone-aware slot timing rules.
//!
//! Two independent checks:
//!
//! - **Past check**: the slot's calendar date in the caller's timezone must not be
//!   before the caller's local "today". The same UTC instant can be "today" for one
//!   caller and "yesterday" for another, so the comparison happens on local dates.
//! - **Schedule config check**: the slot's UTC weekday and UTC `HH:MM` must appear
//!   in the group's configured hours. Configured hours are stored in UTC, so this
//!   check never looks at the caller's timezone.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

use crate::errors::{SlotError, SlotResult};
use crate::models::directory::{GroupScheduleConfig, weekday_key};

pub const DEFAULT_TIMEZONE: &str = "UTC";

pub fn parse_timezone(name: &str) -> SlotResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SlotError::Validation(format!("Unknown timezone '{}'", name)))
}

pub fn validate_timing(datetime: DateTime<Utc>, timezone: &str) -> SlotResult<()> {
    validate_timing_at(datetime, timezone, Utc::now())
}

/// Same as [`validate_timing`] with an explicit notion of "now".
pub fn validate_timing_at(
    datetime: DateTime<Utc>,
    timezone: &str,
    now: DateTime<Utc>,
) -> SlotResult<()> {
    let tz = parse_timezone(timezone)?;
    let slot_date = datetime.with_timezone(&tz).date_naive();
    let today = now.with_timezone(&tz).date_naive();

    if slot_date < today {
        return Err(SlotError::Validation(format!(
            "Slot {} is in the past for timezone {} (local date {}, today is {})",
            datetime.to_rfc3339(),
            timezone,
            slot_date,
            today
        )));
    }

    Ok(())
}

pub fn utc_time_of_day(datetime: DateTime<Utc>) -> String {
    datetime.format("%H:%M").to_string()
}

pub fn validate_against_config(
    config: Option<&GroupScheduleConfig>,
    datetime: DateTime<Utc>,
) -> SlotResult<()> {
    if datetime.second() != 0 || datetime.nanosecond() != 0 {
        return Err(SlotError::Validation(format!(
            "Slot {} must fall on a whole minute",
            datetime.to_rfc3339()
        )));
    }

    let weekday = datetime.weekday();
    let time = utc_time_of_day(datetime);

    let Some(config) = config else {
        return Err(SlotError::Validation(
            "Group has no schedule configuration".to_string(),
        ));
    };

    if config.times_for(weekday).iter().any(|t| *t == time) {
        Ok(())
    } else {
        Err(SlotError::Validation(format!(
            "{} {} UTC is not a configured schedule time for group {}",
            weekday_key(weekday),
            time,
            config.group_id
        )))
    }
}
