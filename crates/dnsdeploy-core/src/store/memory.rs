// # Memory Deployment Store
//
// In-memory implementation of DeploymentStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for tests and for exercising the workflow without touching disk.
//
// ## Crash Behavior
//
// All tracked deployments are forgotten on restart. The provider-side DNS
// records survive, so re-deploying after a crash will fail with a conflict
// at the provider until the stale records are cleaned up.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::deployment_store::{DeploymentRecord, DeploymentStore};

/// In-memory deployment store implementation
///
/// # Example
///
/// ```rust,no_run
/// use dnsdeploy_core::store::MemoryDeploymentStore;
/// use dnsdeploy_core::traits::{DeploymentRecord, DeploymentStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryDeploymentStore::new();
///     let record = DeploymentRecord::new("blog", "blog.example.com", "xyz.app", "r1", "z1");
///     store.insert(record).await?;
///     assert!(store.get("blog").await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDeploymentStore {
    inner: Arc<RwLock<HashMap<String, DeploymentRecord>>>,
}

impl MemoryDeploymentStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of tracked deployments
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl DeploymentStore for MemoryDeploymentStore {
    async fn insert(&self, record: DeploymentRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(&record.name) {
            return Err(Error::record_conflict(&record.name));
        }
        guard.insert(record.name.clone(), record);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<DeploymentRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(name).cloned())
    }

    async fn put(&self, record: DeploymentRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        if !guard.contains_key(&record.name) {
            return Err(Error::not_found(&record.name));
        }
        guard.insert(record.name.clone(), record);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(name);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<DeploymentRecord>, Error> {
        let guard = self.inner.read().await;
        let mut records: Vec<DeploymentRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn flush(&self) -> Result<(), Error> {
        // No-op for the memory store
        Ok(())
    }
}
