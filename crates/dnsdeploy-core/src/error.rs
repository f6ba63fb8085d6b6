//! Error types for the deployment workflow
//!
//! Creation-time errors (zone lookup, record creation) abort a deploy and are
//! surfaced to the caller. Post-creation verification shortfalls (DNS not yet
//! resolved, site not reachable) are recorded in the deployment record and
//! never appear here.

use thiserror::Error;

/// Result type alias for workflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the deployment workflow
#[derive(Error, Debug)]
pub enum Error {
    /// No DNS zone in the provider account covers the requested domain
    #[error("no zone found for domain: {domain}")]
    ZoneNotFound {
        /// The zone apex that was looked up
        domain: String,
    },

    /// A deployment (or provider record) with this name already exists
    #[error("record already exists: {name}")]
    RecordConflict {
        /// The conflicting deployment or record name
        name: String,
    },

    /// The operation referenced a name that is not tracked
    #[error("deployment not found: {name}")]
    NotFound {
        /// The untracked name
        name: String,
    },

    /// Provider API failure (transport, auth, rate limit), surfaced verbatim
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Deployment store failure
    #[error("store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid input (e.g. a malformed domain name)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a zone-not-found error
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound {
            domain: domain.into(),
        }
    }

    /// Create a record-conflict error
    pub fn record_conflict(name: impl Into<String>) -> Self {
        Self::RecordConflict { name: name.into() }
    }

    /// Create a "not found" error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error means "the remote side has no such record/zone"
    ///
    /// Used by best-effort cleanup paths, where a missing remote record is
    /// not an error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ZoneNotFound { .. })
    }
}
