use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

// Directory tables are owned by the family/group management service; this core
// only reads them. They are created here so a fresh database is usable.
const DIRECTORY_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS families (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
        family_id UUID NULL REFERENCES families(id),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS vehicles (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        capacity INTEGER NOT NULL CHECK (capacity >= 0),
        family_id UUID NOT NULL REFERENCES families(id),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS children (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        family_id UUID NOT NULL REFERENCES families(id),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS group_families (
        group_id UUID NOT NULL,
        family_id UUID NOT NULL REFERENCES families(id),
        PRIMARY KEY (group_id, family_id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS group_schedule_hours (
        group_id UUID NOT NULL,
        weekday VARCHAR(9) NOT NULL CHECK (weekday IN (
            'MONDAY', 'TUESDAY', 'WEDNESDAY', 'THURSDAY', 'FRIDAY', 'SATURDAY', 'SUNDAY'
        )),
        time_of_day VARCHAR(5) NOT NULL,
        PRIMARY KEY (group_id, weekday, time_of_day)
    );
    "#,
];

const SLOT_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS schedule_slots (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        group_id UUID NOT NULL,
        datetime TIMESTAMP WITH TIME ZONE NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT schedule_slots_group_datetime_key UNIQUE (group_id, datetime)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS vehicle_assignments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        slot_id UUID NOT NULL REFERENCES schedule_slots(id) ON DELETE CASCADE,
        vehicle_id UUID NOT NULL,
        driver_id UUID NULL,
        seat_override INTEGER NULL CHECK (seat_override BETWEEN 0 AND 10),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT vehicle_assignments_slot_vehicle_key UNIQUE (slot_id, vehicle_id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS child_assignments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        slot_id UUID NOT NULL REFERENCES schedule_slots(id) ON DELETE CASCADE,
        vehicle_assignment_id UUID NOT NULL REFERENCES vehicle_assignments(id) ON DELETE CASCADE,
        child_id UUID NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT child_assignments_slot_child_key UNIQUE (slot_id, child_id)
    );
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_schedule_slots_datetime ON schedule_slots(datetime);",
    "CREATE INDEX IF NOT EXISTS idx_vehicle_assignments_slot_id ON vehicle_assignments(slot_id);",
    "CREATE INDEX IF NOT EXISTS idx_vehicle_assignments_driver_id ON vehicle_assignments(driver_id);",
    "CREATE INDEX IF NOT EXISTS idx_child_assignments_slot_id ON child_assignments(slot_id);",
    "CREATE INDEX IF NOT EXISTS idx_child_assignments_vehicle_assignment_id ON child_assignments(vehicle_assignment_id);",
    "CREATE INDEX IF NOT EXISTS idx_child_assignments_child_id ON child_assignments(child_id);",
    "CREATE INDEX IF NOT EXISTS idx_children_family_id ON children(family_id);",
    "CREATE INDEX IF NOT EXISTS idx_group_families_family_id ON group_families(family_id);",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for statement in DIRECTORY_TABLES.iter().chain(SLOT_TABLES).chain(INDEXES) {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
