// # dnsdeploy-core
//
// Core library for the deployment-and-verification workflow.
//
// ## Architecture Overview
//
// This library automates the lifecycle of a custom-domain deployment:
// - **DnsProvider**: Trait for creating/updating/deleting DNS records via a
//   provider's REST API
// - **TargetResolver**: Trait for checking whether a hostname resolves to the
//   expected target (propagation)
// - **LivenessProber**: Trait for checking whether an HTTP endpoint responds
// - **DeploymentStore**: Trait for persisting one record per tracked
//   deployment
// - **DeployEngine**: Orchestrates create → poll propagation → probe
//   liveness → persist status
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The engine owns the workflow; collaborators
//    are single-shot and stateless
// 2. **Library-First**: All workflow functionality is usable without the CLI
// 3. **Partial success is not failure**: Propagation and liveness shortfalls
//    are recorded in the deployment record, never raised as errors

pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{DeployConfig, ProviderConfig, StoreConfig, WorkflowConfig};
pub use engine::{DeployEngine, EngineEvent, Observation};
pub use error::{Error, Result};
pub use store::{FileDeploymentStore, MemoryDeploymentStore};
pub use traits::{
    DeploymentRecord, DeploymentStatus, DeploymentStore, DnsProvider, LivenessProber,
    TargetResolver,
};
