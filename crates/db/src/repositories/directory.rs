use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{DbChild, DbUser, DbVehicle};

// Read-only lookups against the family/group directory tables.

pub async fn get_vehicle_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbVehicle>> {
    let vehicle = sqlx::query_as::<_, DbVehicle>(
        r#"
        SELECT id, name, capacity, family_id
        FROM vehicles
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(vehicle)
}

pub async fn get_child_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbChild>> {
    let child = sqlx::query_as::<_, DbChild>(
        r#"
        SELECT c.id, c.name, c.family_id,
               COALESCE(
                   array_agg(gf.group_id) FILTER (WHERE gf.group_id IS NOT NULL),
                   '{}'
               ) AS group_ids
        FROM children c
        LEFT JOIN group_families gf ON gf.family_id = c.family_id
        WHERE c.id = $1
        GROUP BY c.id, c.name, c.family_id
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(child)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, name, timezone, family_id
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_children_by_group(pool: &Pool<Postgres>, group_id: Uuid) -> Result<Vec<DbChild>> {
    let children = sqlx::query_as::<_, DbChild>(
        r#"
        SELECT c.id, c.name, c.family_id,
               array_agg(all_gf.group_id) AS group_ids
        FROM children c
        JOIN group_families gf ON gf.family_id = c.family_id AND gf.group_id = $1
        JOIN group_families all_gf ON all_gf.family_id = c.family_id
        GROUP BY c.id, c.name, c.family_id
        ORDER BY c.name ASC
        "#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(children)
}

pub async fn is_user_in_group(pool: &Pool<Postgres>, user_id: Uuid, group_id: Uuid) -> Result<bool> {
    let is_member = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM users u
            JOIN group_families gf ON gf.family_id = u.family_id
            WHERE u.id = $1 AND gf.group_id = $2
        );
        "#,
    )
    .bind(user_id)
    .bind(group_id)
    .fetch_one(pool)
    .await?;

    Ok(is_member)
}

pub async fn is_user_in_family_of_child(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    child_id: Uuid,
) -> Result<bool> {
    let is_member = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM users u
            JOIN children c ON c.family_id = u.family_id
            WHERE u.id = $1 AND c.id = $2
        );
        "#,
    )
    .bind(user_id)
    .bind(child_id)
    .fetch_one(pool)
    .await?;

    Ok(is_member)
}

pub async fn is_user_in_family_of_vehicle(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    vehicle_id: Uuid,
) -> Result<bool> {
    let is_member = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM users u
            JOIN vehicles v ON v.family_id = u.family_id
            WHERE u.id = $1 AND v.id = $2
        );
        "#,
    )
    .bind(user_id)
    .bind(vehicle_id)
    .fetch_one(pool)
    .await?;

    Ok(is_member)
}
