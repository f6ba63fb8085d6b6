//! Collaborator traits for the deployment workflow
//!
//! The engine orchestrates three external collaborators (DNS provider, target
//! resolver, liveness prober) and one owned collaborator (the deployment
//! store). Each is defined as a trait so tests can substitute controlled
//! implementations.

pub mod deployment_store;
pub mod dns_provider;
pub mod prober;

pub use deployment_store::{DeploymentRecord, DeploymentStatus, DeploymentStore};
pub use dns_provider::{DnsProvider, ProviderRecord, RecordSpec, Zone};
pub use prober::{LivenessProber, ProbeOutcome, TargetResolver};
