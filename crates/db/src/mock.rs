pub mod collaborators;
pub mod directory;
pub mod memory;

pub use collaborators::{MockAccessPolicy, MockDirectory, MockScheduleConfigSource};
pub use directory::MemoryDirectory;
pub use memory::MemoryStore;
