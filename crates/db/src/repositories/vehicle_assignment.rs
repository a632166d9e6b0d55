use carpool_core::models::slot::NewVehicleAssignment;
use chrono::Utc;
use eyre::{Result, eyre};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::DbVehicleAssignment;

pub async fn create_vehicle_assignment(
    conn: &mut PgConnection,
    assignment: &NewVehicleAssignment,
) -> Result<DbVehicleAssignment> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<_, DbVehicleAssignment>(
        r#"
        INSERT INTO vehicle_assignments (id, slot_id, vehicle_id, driver_id, seat_override, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, slot_id, vehicle_id, driver_id, seat_override, created_at
        "#,
    )
    .bind(id)
    .bind(assignment.slot_id)
    .bind(assignment.vehicle_id)
    .bind(assignment.driver_id)
    .bind(assignment.seat_override)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

pub async fn get_vehicle_assignment_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<DbVehicleAssignment>> {
    let row = sqlx::query_as::<_, DbVehicleAssignment>(
        r#"
        SELECT id, slot_id, vehicle_id, driver_id, seat_override, created_at
        FROM vehicle_assignments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

pub async fn update_vehicle_assignment(
    conn: &mut PgConnection,
    id: Uuid,
    driver_id: Option<Uuid>,
    seat_override: Option<i32>,
) -> Result<DbVehicleAssignment> {
    let row = sqlx::query_as::<_, DbVehicleAssignment>(
        r#"
        UPDATE vehicle_assignments
        SET driver_id = $2, seat_override = $3
        WHERE id = $1
        RETURNING id, slot_id, vehicle_id, driver_id, seat_override, created_at
        "#,
    )
    .bind(id)
    .bind(driver_id)
    .bind(seat_override)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| eyre!("Vehicle assignment {} not found", id))?;

    Ok(row)
}

pub async fn delete_vehicle_assignment(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM vehicle_assignments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
