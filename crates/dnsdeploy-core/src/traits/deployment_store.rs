// # Deployment Store Trait
//
// Defines the interface for persisting one row per tracked deployment.
//
// ## Purpose
//
// The store is the single source of truth for deployment lifecycle:
// - `name` is unique across all stored records (enforced by `insert`)
// - `updated_at` is refreshed on every mutation
// - Removal deletes the row outright; there is no soft-delete
//
// ## Implementations
//
// - File-based: JSON file with atomic writes (`FileDeploymentStore`)
// - In-memory: for tests and throwaway runs (`MemoryDeploymentStore`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked deployment
///
/// States advance monotonically Pending → Propagated → Live. `Failed` is
/// reachable from any state on an unrecoverable provider error. Removal is
/// terminal and deletes the row, so it has no stored variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// Record created at the provider, propagation not yet observed
    Pending,
    /// DNS resolution matches the expected target
    Propagated,
    /// The site answered an HTTP probe with a 2xx/3xx status
    Live,
    /// An unrecoverable provider error occurred
    Failed,
}

impl DeploymentStatus {
    /// Position in the monotonic lifecycle, used to prevent re-checks from
    /// moving a record backwards
    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Propagated => 1,
            Self::Live => 2,
            Self::Failed => 3,
        }
    }

    /// Human-readable label for CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Propagated => "propagated",
            Self::Live => "live",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Unique human identifier, immutable after creation
    pub name: String,
    /// Fully-qualified hostname the record points from
    pub custom_domain: String,
    /// Fully-qualified hostname the record points to
    pub target: String,
    /// Provider-assigned record identifier, set once on creation
    pub provider_record_id: String,
    /// Provider-assigned zone identifier, set once on creation
    pub provider_zone_id: String,
    /// Lifecycle state
    pub status: DeploymentStatus,
    /// Whether DNS resolution has been observed to match `target`
    pub dns_propagated: bool,
    /// Whether an HTTP probe of `custom_domain` succeeded
    pub site_live: bool,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Refreshed on every mutation
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl DeploymentRecord {
    /// Create a freshly-deployed record in the Pending state
    pub fn new(
        name: impl Into<String>,
        custom_domain: impl Into<String>,
        target: impl Into<String>,
        provider_record_id: impl Into<String>,
        provider_zone_id: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            name: name.into(),
            custom_domain: custom_domain.into(),
            target: target.into(),
            provider_record_id: provider_record_id.into(),
            provider_zone_id: provider_zone_id.into(),
            status: DeploymentStatus::Pending,
            dns_propagated: false,
            site_live: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the lifecycle state, never moving backwards
    ///
    /// A record that is already Live stays Live when a later re-check only
    /// establishes Propagated.
    pub fn advance(&mut self, status: DeploymentStatus) {
        if status.rank() > self.status.rank() {
            self.status = status;
        }
    }

    /// Refresh `updated_at`; called before every store mutation
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

/// Trait for deployment store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks. Access
/// is read-modify-write at the granularity of one record; no cross-record
/// transactions are needed.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Insert a new record
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully inserted
    /// - `Err(Error::RecordConflict)`: A record with this name already exists
    /// - `Err(Error)`: Storage error
    async fn insert(&self, record: DeploymentRecord) -> Result<(), crate::Error>;

    /// Get a record by name
    async fn get(&self, name: &str) -> Result<Option<DeploymentRecord>, crate::Error>;

    /// Replace an existing record
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully replaced
    /// - `Err(Error::NotFound)`: No record with this name exists
    async fn put(&self, record: DeploymentRecord) -> Result<(), crate::Error>;

    /// Delete a record by name (no error if absent)
    async fn delete(&self, name: &str) -> Result<(), crate::Error>;

    /// List all tracked records
    async fn list_all(&self) -> Result<Vec<DeploymentRecord>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_never_moves_backwards() {
        let mut record = DeploymentRecord::new("blog", "blog.example.com", "xyz.app", "r1", "z1");
        assert_eq!(record.status, DeploymentStatus::Pending);

        record.advance(DeploymentStatus::Live);
        record.advance(DeploymentStatus::Propagated);
        assert_eq!(record.status, DeploymentStatus::Live);
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = DeploymentRecord::new("blog", "blog.example.com", "xyz.app", "r1", "z1");
        let json = serde_json::to_string(&record).unwrap();
        let back: DeploymentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
