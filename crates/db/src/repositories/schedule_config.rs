use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::DbScheduleHour;

pub async fn get_schedule_hours_by_group(
    pool: &Pool<Postgres>,
    group_id: Uuid,
) -> Result<Vec<DbScheduleHour>> {
    let hours = sqlx::query_as::<_, DbScheduleHour>(
        r#"
        SELECT group_id, weekday, time_of_day
        FROM group_schedule_hours
        WHERE group_id = $1
        ORDER BY weekday ASC, time_of_day ASC
        "#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(hours)
}
