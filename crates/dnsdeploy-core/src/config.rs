//! Configuration types for the deployment workflow
//!
//! Polling budgets are policy, not protocol: the propagation timeout and the
//! poll interval are configurable here rather than being hardcoded constants.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main deployment toolkit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Deployment store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Workflow polling settings
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl DeployConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.workflow.validate()?;
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Zone ID (optional, auto-detected from the domain when absent)
        zone_id: Option<String>,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
        }
    }
}

/// Deployment store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-backed store
    File {
        /// Path to the deployments file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

/// Workflow polling settings
///
/// The propagation loop polls DNS resolution every `poll_interval_secs` up to
/// a total budget of `propagation_timeout_secs`. Exhausting the budget is not
/// a failure: DNS may legitimately take longer, and the deploy continues to
/// the liveness check with `dns_propagated = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Total propagation polling budget (in seconds)
    #[serde(default = "default_propagation_timeout_secs")]
    pub propagation_timeout_secs: u64,

    /// Interval between propagation polls (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Interval between monitor observations (in seconds)
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log) rather than
    /// blocking the workflow.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl WorkflowConfig {
    /// Validate the workflow settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("poll interval must be > 0"));
        }
        if self.monitor_interval_secs == 0 {
            return Err(crate::Error::config("monitor interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Propagation polling budget as a `Duration`
    pub fn propagation_timeout(&self) -> Duration {
        Duration::from_secs(self.propagation_timeout_secs)
    }

    /// Propagation poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Monitor observation interval as a `Duration`
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    /// Number of propagation polls the budget allows (⌈timeout / interval⌉)
    pub fn max_polls(&self) -> u64 {
        self.propagation_timeout_secs.div_ceil(self.poll_interval_secs)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            propagation_timeout_secs: default_propagation_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            monitor_interval_secs: default_monitor_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_propagation_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_monitor_interval_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    256
}
