// # DNS Provider Trait
//
// Defines the interface for managing DNS records via a provider's REST API.
//
// ## Implementations
//
// - Cloudflare: `dnsdeploy-provider-cloudflare` crate
//
// ## Trust boundary
//
// Providers are isolated, stateless, single-shot API clients:
// - They perform HTTP calls to their own endpoints and nothing else
// - They never touch the deployment store (owned by `DeployEngine`)
// - They never poll or sleep (polling policy is owned by `DeployEngine`)
// - They report duplicates via structured error codes where the API offers
//   them, not by matching error-message text

use async_trait::async_trait;

/// A DNS provider's administrative unit for a root domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider-assigned zone identifier
    pub id: String,
    /// Zone apex name (e.g. "example.com")
    pub name: String,
}

/// A single DNS record within a zone, as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    /// Provider-assigned record identifier
    pub id: String,
    /// Record type (e.g. "CNAME", "A")
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record content (target hostname or address)
    pub content: String,
    /// Whether the record is proxied through the provider's edge
    pub proxied: bool,
}

/// Parameters for creating a DNS record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    /// Record type (e.g. "CNAME")
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record content
    pub content: String,
    /// Whether to proxy the record through the provider's edge
    pub proxied: bool,
}

impl RecordSpec {
    /// Build a CNAME record spec pointing `name` at `target`
    pub fn cname(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            record_type: "CNAME".to_string(),
            name: name.into(),
            content: target.into(),
            proxied: false,
        }
    }

    /// Set whether the record is proxied
    pub fn proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }
}

/// Trait for DNS provider implementations
///
/// All calls are synchronous HTTP requests from the caller's point of view;
/// authentication is a bearer credential supplied at construction time by the
/// configuration loader.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List all zones in the account
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// Find the zone whose apex matches `apex`
    ///
    /// # Returns
    ///
    /// - `Ok(Zone)`: The matching zone
    /// - `Err(Error::ZoneNotFound)`: No zone in the account covers `apex`
    async fn find_zone(&self, apex: &str) -> Result<Zone, crate::Error>;

    /// List the DNS records in a zone
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ProviderRecord>, crate::Error>;

    /// Create a DNS record and return the provider-assigned record id
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The new record's identifier
    /// - `Err(Error::RecordConflict)`: The provider reported a duplicate
    /// - `Err(Error::Provider)`: Any other API failure
    async fn create_record(&self, zone_id: &str, spec: &RecordSpec)
    -> Result<String, crate::Error>;

    /// Update an existing record's content
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        content: &str,
    ) -> Result<(), crate::Error>;

    /// Delete a record
    ///
    /// A missing record surfaces as `Error::NotFound`; callers performing
    /// best-effort cleanup may ignore it.
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
