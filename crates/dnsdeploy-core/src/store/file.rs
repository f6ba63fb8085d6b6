// # File Deployment Store
//
// File-based implementation of DeploymentStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: new state is written to a temporary file, then renamed
// - Corruption detection: JSON is validated on load
// - Automatic backup: a `.backup` of the last known good state is kept
// - Recovery: falls back to the backup if the main file is corrupted
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "deployments": {
//     "blog": {
//       "name": "blog",
//       "custom_domain": "blog.example.com",
//       "target": "xyz.manus.space",
//       "provider_record_id": "r1",
//       "provider_zone_id": "z1",
//       "status": "live",
//       "dns_propagated": true,
//       "site_live": true,
//       "created_at": "2025-01-09T12:00:00Z",
//       "updated_at": "2025-01-09T12:01:05Z"
//     }
//   }
// }
// ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::deployment_store::{DeploymentRecord, DeploymentStore};

/// State file format version, for future migration if the format changes
const STATE_FILE_VERSION: &str = "1.0";

/// File-based deployment store with crash recovery
///
/// Every mutation is written through to disk immediately: a deployment that
/// was reported as created must survive a crash.
#[derive(Debug)]
pub struct FileDeploymentStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    deployments: HashMap<String, DeploymentRecord>,
    dirty: bool,
}

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    deployments: HashMap<String, DeploymentRecord>,
}

impl FileDeploymentStore {
    /// Create or load a file deployment store
    ///
    /// This will:
    /// 1. Try to load an existing state file
    /// 2. If corruption is detected, try to load from the backup
    /// 3. If both fail, start with empty state
    /// 4. Create parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "failed to create state directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let deployments = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                deployments,
                dirty: false,
            })),
        })
    }

    /// Load state from file, falling back to the backup on corruption
    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, DeploymentRecord>, Error> {
        match Self::load(path).await {
            Ok(deployments) => {
                tracing::debug!(
                    "loaded deployment state: {} record(s)",
                    deployments.len()
                );
                Ok(deployments)
            }
            Err(e @ Error::Json(_)) => {
                tracing::warn!(
                    "deployment state file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("no backup file found, starting with empty state");
                    return Ok(HashMap::new());
                }

                match Self::load(&backup_path).await {
                    Ok(deployments) => {
                        tracing::info!(
                            "recovered deployment state from backup: {} record(s)",
                            deployments.len()
                        );
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "failed to restore state file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(deployments)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "backup also corrupted: {}. Starting with empty state.",
                            backup_err
                        );
                        Ok(HashMap::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load state from one file
    async fn load(path: &Path) -> Result<HashMap<String, DeploymentRecord>, Error> {
        if !path.exists() {
            tracing::debug!("state file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!("failed to read state file {}: {}", path.display(), e))
        })?;

        let state_file: StateFileFormat = serde_json::from_str(&content)?;

        if state_file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "state file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STATE_FILE_VERSION,
                state_file.version
            );
        }

        Ok(state_file.deployments)
    }

    /// Write state to disk atomically (write temp file, back up, rename)
    async fn write_state(&self) -> Result<(), Error> {
        let json = {
            let state_guard = self.state.read().await;
            let state_file = StateFileFormat {
                version: STATE_FILE_VERSION.to_string(),
                deployments: state_guard.deployments.clone(),
            };
            serde_json::to_string_pretty(&state_file)?
        };

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::store(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep a backup of the previous good state before replacing it
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        {
            let mut state_guard = self.state.write().await;
            state_guard.dirty = false;
        }

        tracing::trace!("deployment state written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl DeploymentStore for FileDeploymentStore {
    async fn insert(&self, record: DeploymentRecord) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            if state_guard.deployments.contains_key(&record.name) {
                return Err(Error::record_conflict(&record.name));
            }
            state_guard.deployments.insert(record.name.clone(), record);
            state_guard.dirty = true;
        }

        // Immediate write for durability
        self.write_state().await
    }

    async fn get(&self, name: &str) -> Result<Option<DeploymentRecord>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.deployments.get(name).cloned())
    }

    async fn put(&self, record: DeploymentRecord) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            if !state_guard.deployments.contains_key(&record.name) {
                return Err(Error::not_found(&record.name));
            }
            state_guard.deployments.insert(record.name.clone(), record);
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    async fn delete(&self, name: &str) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            state_guard.deployments.remove(name);
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    async fn list_all(&self) -> Result<Vec<DeploymentRecord>, Error> {
        let state_guard = self.state.read().await;
        let mut records: Vec<DeploymentRecord> =
            state_guard.deployments.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn flush(&self) -> Result<(), Error> {
        let state_guard = self.state.read().await;
        if state_guard.dirty {
            drop(state_guard);
            self.write_state().await
        } else {
            Ok(())
        }
    }
}
