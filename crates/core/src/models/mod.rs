pub mod assignment;
pub mod conflict;
pub mod directory;
pub mod slot;
