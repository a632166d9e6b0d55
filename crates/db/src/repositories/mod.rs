pub mod child_assignment;
pub mod directory;
pub mod schedule_config;
pub mod slot;
pub mod vehicle_assignment;
