use chrono::Utc;
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::DbChildAssignment;

pub async fn create_child_assignment(
    conn: &mut PgConnection,
    slot_id: Uuid,
    vehicle_assignment_id: Uuid,
    child_id: Uuid,
) -> Result<DbChildAssignment> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<_, DbChildAssignment>(
        r#"
        INSERT INTO child_assignments (id, slot_id, vehicle_assignment_id, child_id, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, slot_id, vehicle_assignment_id, child_id, created_at
        "#,
    )
    .bind(id)
    .bind(slot_id)
    .bind(vehicle_assignment_id)
    .bind(child_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

pub async fn delete_child_assignment(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM child_assignments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
