//! Deployment store implementations
//!
//! - [`MemoryDeploymentStore`]: in-memory, for tests and throwaway runs
//! - [`FileDeploymentStore`]: JSON file with atomic writes and crash recovery

mod file;
mod memory;

pub use file::FileDeploymentStore;
pub use memory::MemoryDeploymentStore;
