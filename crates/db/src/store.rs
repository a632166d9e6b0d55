//! PostgreSQL implementation of the slot store.
//!
//! Mutations run inside `SERIALIZABLE` transactions with a local statement and
//! lock timeout. PostgreSQL error codes are mapped onto [`StoreError`] so the
//! engine can tell a uniqueness race from a serialization failure.

use std::time::Duration;

use async_trait::async_trait;
use carpool_core::models::slot::{
    ChildAssignment, NewVehicleAssignment, ScheduleSlot, SlotDetails, VehicleAssignment,
};
use carpool_core::store::{SlotReads, SlotStore, SlotTransaction, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::DbPool;
use crate::repositories::{child_assignment, slot, vehicle_assignment};

const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const QUERY_CANCELED: &str = "57014";

/// Classifies a repository error by the PostgreSQL error code it carries, if any.
pub fn classify_error(report: eyre::Report) -> StoreError {
    let (code, constraint, message) = match report.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => (
            db_err.code().map(|code| code.into_owned()),
            db_err.constraint().map(str::to_string),
            db_err.message().to_string(),
        ),
        Some(sqlx::Error::PoolTimedOut) => return StoreError::Timeout(report.to_string()),
        _ => return StoreError::Other(report),
    };

    match code.as_deref() {
        Some(UNIQUE_VIOLATION) => StoreError::UniqueViolation { constraint },
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => StoreError::Serialization(message),
        Some(LOCK_NOT_AVAILABLE) | Some(QUERY_CANCELED) => StoreError::Timeout(message),
        _ => StoreError::Other(report),
    }
}

fn store_err(err: sqlx::Error) -> StoreError {
    classify_error(eyre::Report::new(err))
}

#[derive(Clone)]
pub struct PgSlotStore {
    pool: DbPool,
    statement_timeout: Duration,
}

impl PgSlotStore {
    pub fn new(pool: DbPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }
}

pub struct PgReader {
    conn: PoolConnection<Postgres>,
}

pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SlotStore for PgSlotStore {
    type Reader = PgReader;
    type Tx = PgTransaction;

    async fn reader(&self) -> StoreResult<PgReader> {
        let conn = self.pool.acquire().await.map_err(store_err)?;
        Ok(PgReader { conn })
    }

    async fn begin_serializable(&self) -> StoreResult<PgTransaction> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        // SET LOCAL does not accept bind parameters.
        let timeout_ms = self.statement_timeout.as_millis();
        sqlx::query(&format!("SET LOCAL statement_timeout = {}", timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        sqlx::query(&format!("SET LOCAL lock_timeout = {}", timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        Ok(PgTransaction { tx })
    }
}

async fn read_slot(conn: &mut PgConnection, slot_id: Uuid) -> StoreResult<Option<SlotDetails>> {
    let Some(row) = slot::get_slot_by_id(conn, slot_id)
        .await
        .map_err(classify_error)?
    else {
        return Ok(None);
    };
    let mut details = slot::load_details(conn, vec![row])
        .await
        .map_err(classify_error)?;
    Ok(details.pop())
}

async fn read_slot_at(
    conn: &mut PgConnection,
    group_id: Uuid,
    datetime: DateTime<Utc>,
) -> StoreResult<Option<SlotDetails>> {
    let Some(row) = slot::get_slot_by_group_and_datetime(conn, group_id, datetime)
        .await
        .map_err(classify_error)?
    else {
        return Ok(None);
    };
    let mut details = slot::load_details(conn, vec![row])
        .await
        .map_err(classify_error)?;
    Ok(details.pop())
}

async fn read_slots_at_instant(
    conn: &mut PgConnection,
    datetime: DateTime<Utc>,
    group_id: Option<Uuid>,
    exclude_slot_id: Option<Uuid>,
) -> StoreResult<Vec<SlotDetails>> {
    let rows = slot::get_slots_at_instant(conn, datetime, group_id, exclude_slot_id)
        .await
        .map_err(classify_error)?;
    slot::load_details(conn, rows).await.map_err(classify_error)
}

async fn read_slots_in_range(
    conn: &mut PgConnection,
    group_id: Uuid,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> StoreResult<Vec<SlotDetails>> {
    let rows = slot::get_slots_by_group_in_range(conn, group_id, start, end)
        .await
        .map_err(classify_error)?;
    slot::load_details(conn, rows).await.map_err(classify_error)
}

async fn read_vehicle_assignment(
    conn: &mut PgConnection,
    id: Uuid,
) -> StoreResult<Option<VehicleAssignment>> {
    let row = vehicle_assignment::get_vehicle_assignment_by_id(conn, id)
        .await
        .map_err(classify_error)?;
    Ok(row.map(Into::into))
}

// Both handles deref to a PgConnection; one macro keeps the read paths identical.
macro_rules! impl_slot_reads {
    ($ty:ty, $field:ident) => {
        #[async_trait]
        impl SlotReads for $ty {
            async fn slot(&mut self, slot_id: Uuid) -> StoreResult<Option<SlotDetails>> {
                read_slot(&mut *self.$field, slot_id).await
            }

            async fn slot_at(
                &mut self,
                group_id: Uuid,
                datetime: DateTime<Utc>,
            ) -> StoreResult<Option<SlotDetails>> {
                read_slot_at(&mut *self.$field, group_id, datetime).await
            }

            async fn slots_at_instant(
                &mut self,
                datetime: DateTime<Utc>,
                group_id: Option<Uuid>,
                exclude_slot_id: Option<Uuid>,
            ) -> StoreResult<Vec<SlotDetails>> {
                read_slots_at_instant(&mut *self.$field, datetime, group_id, exclude_slot_id).await
            }

            async fn slots_in_range(
                &mut self,
                group_id: Uuid,
                start: Option<DateTime<Utc>>,
                end: Option<DateTime<Utc>>,
            ) -> StoreResult<Vec<SlotDetails>> {
                read_slots_in_range(&mut *self.$field, group_id, start, end).await
            }

            async fn vehicle_assignment(
                &mut self,
                vehicle_assignment_id: Uuid,
            ) -> StoreResult<Option<VehicleAssignment>> {
                read_vehicle_assignment(&mut *self.$field, vehicle_assignment_id).await
            }
        }
    };
}

impl_slot_reads!(PgReader, conn);
impl_slot_reads!(PgTransaction, tx);

#[async_trait]
impl SlotTransaction for PgTransaction {
    async fn insert_slot(
        &mut self,
        group_id: Uuid,
        datetime: DateTime<Utc>,
    ) -> StoreResult<ScheduleSlot> {
        let row = slot::create_slot(&mut self.tx, group_id, datetime)
            .await
            .map_err(classify_error)?;
        Ok(row.into())
    }

    async fn delete_slot(&mut self, slot_id: Uuid) -> StoreResult<()> {
        slot::delete_slot(&mut self.tx, slot_id)
            .await
            .map_err(classify_error)
    }

    async fn insert_vehicle_assignment(
        &mut self,
        assignment: NewVehicleAssignment,
    ) -> StoreResult<VehicleAssignment> {
        let row = vehicle_assignment::create_vehicle_assignment(&mut self.tx, &assignment)
            .await
            .map_err(classify_error)?;
        Ok(row.into())
    }

    async fn update_vehicle_assignment(
        &mut self,
        vehicle_assignment_id: Uuid,
        driver_id: Option<Uuid>,
        seat_override: Option<i32>,
    ) -> StoreResult<VehicleAssignment> {
        let row = vehicle_assignment::update_vehicle_assignment(
            &mut self.tx,
            vehicle_assignment_id,
            driver_id,
            seat_override,
        )
        .await
        .map_err(classify_error)?;
        Ok(row.into())
    }

    async fn delete_vehicle_assignment(&mut self, vehicle_assignment_id: Uuid) -> StoreResult<()> {
        vehicle_assignment::delete_vehicle_assignment(&mut self.tx, vehicle_assignment_id)
            .await
            .map_err(classify_error)
    }

    async fn insert_child_assignment(
        &mut self,
        slot_id: Uuid,
        vehicle_assignment_id: Uuid,
        child_id: Uuid,
    ) -> StoreResult<ChildAssignment> {
        let row = child_assignment::create_child_assignment(
            &mut self.tx,
            slot_id,
            vehicle_assignment_id,
            child_id,
        )
        .await
        .map_err(classify_error)?;
        Ok(row.into())
    }

    async fn delete_child_assignment(&mut self, child_assignment_id: Uuid) -> StoreResult<()> {
        child_assignment::delete_child_assignment(&mut self.tx, child_assignment_id)
            .await
            .map_err(classify_error)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(store_err)
    }
}
