use std::collections::HashMap;

use carpool_core::models::slot::{ChildAssignment, SlotDetails, VehicleAssignment};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::{DbChildAssignment, DbScheduleSlot, DbVehicleAssignment};

pub async fn create_slot(
    conn: &mut PgConnection,
    group_id: Uuid,
    datetime: DateTime<Utc>,
) -> Result<DbScheduleSlot> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!("Creating slot: id={}, group_id={}, datetime={}", id, group_id, datetime);

    let slot = sqlx::query_as::<_, DbScheduleSlot>(
        r#"
        INSERT INTO schedule_slots (id, group_id, datetime, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, group_id, datetime, created_at
        "#,
    )
    .bind(id)
    .bind(group_id)
    .bind(datetime)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(slot)
}

pub async fn get_slot_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbScheduleSlot>> {
    let slot = sqlx::query_as::<_, DbScheduleSlot>(
        r#"
        SELECT id, group_id, datetime, created_at
        FROM schedule_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(slot)
}

pub async fn get_slot_by_group_and_datetime(
    conn: &mut PgConnection,
    group_id: Uuid,
    datetime: DateTime<Utc>,
) -> Result<Option<DbScheduleSlot>> {
    let slot = sqlx::query_as::<_, DbScheduleSlot>(
        r#"
        SELECT id, group_id, datetime, created_at
        FROM schedule_slots
        WHERE group_id = $1 AND datetime = $2
        "#,
    )
    .bind(group_id)
    .bind(datetime)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(slot)
}

pub async fn get_slots_at_instant(
    conn: &mut PgConnection,
    datetime: DateTime<Utc>,
    group_id: Option<Uuid>,
    exclude_slot_id: Option<Uuid>,
) -> Result<Vec<DbScheduleSlot>> {
    let slots = sqlx::query_as::<_, DbScheduleSlot>(
        r#"
        SELECT id, group_id, datetime, created_at
        FROM schedule_slots
        WHERE datetime = $1
          AND ($2::uuid IS NULL OR group_id = $2)
          AND ($3::uuid IS NULL OR id <> $3)
        ORDER BY created_at ASC
        "#,
    )
    .bind(datetime)
    .bind(group_id)
    .bind(exclude_slot_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(slots)
}

pub async fn get_slots_by_group_in_range(
    conn: &mut PgConnection,
    group_id: Uuid,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<DbScheduleSlot>> {
    let slots = sqlx::query_as::<_, DbScheduleSlot>(
        r#"
        SELECT id, group_id, datetime, created_at
        FROM schedule_slots
        WHERE group_id = $1
          AND ($2::timestamptz IS NULL OR datetime >= $2)
          AND ($3::timestamptz IS NULL OR datetime < $3)
        ORDER BY datetime ASC
        "#,
    )
    .bind(group_id)
    .bind(start)
    .bind(end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(slots)
}

pub async fn delete_slot(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM schedule_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Loads every assignment of the given slots in two queries and groups them per slot.
pub async fn load_details(
    conn: &mut PgConnection,
    slots: Vec<DbScheduleSlot>,
) -> Result<Vec<SlotDetails>> {
    if slots.is_empty() {
        return Ok(Vec::new());
    }

    let slot_ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();

    let vehicles = sqlx::query_as::<_, DbVehicleAssignment>(
        r#"
        SELECT id, slot_id, vehicle_id, driver_id, seat_override, created_at
        FROM vehicle_assignments
        WHERE slot_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(&slot_ids)
    .fetch_all(&mut *conn)
    .await?;

    let children = sqlx::query_as::<_, DbChildAssignment>(
        r#"
        SELECT id, slot_id, vehicle_assignment_id, child_id, created_at
        FROM child_assignments
        WHERE slot_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(&slot_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut vehicles_by_slot: HashMap<Uuid, Vec<VehicleAssignment>> = HashMap::new();
    for row in vehicles {
        vehicles_by_slot.entry(row.slot_id).or_default().push(row.into());
    }

    let mut children_by_slot: HashMap<Uuid, Vec<ChildAssignment>> = HashMap::new();
    for row in children {
        children_by_slot.entry(row.slot_id).or_default().push(row.into());
    }

    let details = slots
        .into_iter()
        .map(|slot| SlotDetails {
            vehicles: vehicles_by_slot.remove(&slot.id).unwrap_or_default(),
            children: children_by_slot.remove(&slot.id).unwrap_or_default(),
            slot: slot.into(),
        })
        .collect();

    Ok(details)
}
