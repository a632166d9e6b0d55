use std::sync::Arc;

use carpool_core::collaborators::{Directory, ScheduleConfigSource};
use carpool_core::errors::SlotResult;
use carpool_core::timing::{self, DEFAULT_TIMEZONE};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Applies the timing rules using the caller's timezone from the directory and
/// the group's configured hours.
#[derive(Clone)]
pub struct SlotTimingValidator {
    directory: Arc<dyn Directory>,
    schedule_config: Arc<dyn ScheduleConfigSource>,
}

impl SlotTimingValidator {
    pub fn new(
        directory: Arc<dyn Directory>,
        schedule_config: Arc<dyn ScheduleConfigSource>,
    ) -> Self {
        Self {
            directory,
            schedule_config,
        }
    }

    /// Callers unknown to the directory are treated as UTC.
    pub async fn caller_timezone(&self, caller_id: Uuid) -> SlotResult<String> {
        let timezone = self
            .directory
            .user(caller_id)
            .await?
            .map(|user| user.timezone)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        Ok(timezone)
    }

    pub async fn validate_timing(&self, caller_id: Uuid, datetime: DateTime<Utc>) -> SlotResult<()> {
        let timezone = self.caller_timezone(caller_id).await?;
        debug!("Checking {} against caller timezone {}", datetime, timezone);
        timing::validate_timing(datetime, &timezone)
    }

    pub async fn validate_against_schedule_config(
        &self,
        group_id: Uuid,
        datetime: DateTime<Utc>,
    ) -> SlotResult<()> {
        let config = self.schedule_config.schedule_config(group_id).await?;
        timing::validate_against_config(config.as_ref(), datetime)
    }
}
