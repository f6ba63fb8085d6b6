// # Cloudflare DNS Provider
//
// Implements `DnsProvider` against Cloudflare API v4.
//
// ## Behavior
//
// - Makes one HTTP request per trait call (polling and retries are owned by
//   `DeployEngine`)
// - HTTP timeout configured (30 seconds)
// - Duplicate records are detected via the API's structured error codes,
//   never by matching error-message text
// - The API token never appears in logs or Debug output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use dnsdeploy_core::traits::{DnsProvider, ProviderRecord, RecordSpec, Zone};
use dnsdeploy_core::{Error, Result};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare error codes meaning "an identical record already exists"
///
/// 81053: "An A, AAAA, or CNAME record with that host already exists"
/// 81057: "Record already exists"
const DUPLICATE_RECORD_CODES: &[u32] = &[81053, 81057];

/// TTL value 1 means "automatic" in the Cloudflare API
const RECORD_TTL_AUTO: u32 = 1;

/// Cloudflare API response envelope
///
/// Every v4 endpoint wraps its payload in `{ success, errors, result }`.
/// Failed calls carry structured `errors` entries with numeric codes.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
}

/// One structured error entry from the API envelope
#[derive(Debug, Deserialize)]
struct ApiError {
    code: u32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ZoneResult {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordResult {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    #[serde(default)]
    proxied: bool,
}

/// Cloudflare DNS provider
///
/// Stateless, single-shot API client. All coordination (polling policy,
/// status tracking) is owned by `DeployEngine`.
pub struct CloudflareProvider {
    /// Cloudflare API token, never logged
    api_token: String,

    /// Zone ID (optional, auto-discovered from the domain when absent)
    zone_id: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// The Debug implementation intentionally does not expose the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Optional zone ID; skips zone discovery when present
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty.
    pub fn new(api_token: impl Into<String>, zone_id: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider("cloudflare", format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            zone_id,
            client,
        })
    }

    /// Send a request and unwrap the API envelope
    ///
    /// `subject` names what was being fetched, for error messages and for the
    /// `NotFound` mapping on 404.
    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        subject: &str,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("failed to read response: {e}")))?;

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) => return Err(map_http_status(status, subject, &body)),
        };

        if envelope.success {
            return envelope.result.ok_or_else(|| {
                Error::provider("cloudflare", format!("{subject}: response carried no result"))
            });
        }

        if is_duplicate(&envelope.errors) {
            return Err(Error::record_conflict(subject));
        }
        Err(map_api_errors(status, subject, &envelope.errors))
    }

    fn url(&self, path: &str) -> String {
        format!("{CLOUDFLARE_API_BASE}{path}")
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let zones: Vec<ZoneResult> = self
            .call(self.client.get(self.url("/zones")), "zones")
            .await?;
        Ok(zones
            .into_iter()
            .map(|z| Zone {
                id: z.id,
                name: z.name,
            })
            .collect())
    }

    async fn find_zone(&self, apex: &str) -> Result<Zone> {
        // A pre-configured zone ID skips discovery entirely
        if let Some(ref zone_id) = self.zone_id {
            tracing::debug!("using pre-configured zone ID");
            return Ok(Zone {
                id: zone_id.clone(),
                name: apex.to_string(),
            });
        }

        tracing::debug!("looking up zone for {}", apex);
        let url = format!("{}?name={}", self.url("/zones"), apex);
        let zones: Vec<ZoneResult> = self.call(self.client.get(&url), apex).await?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::zone_not_found(apex))?;
        tracing::debug!("found zone {} ({})", zone.name, zone.id);
        Ok(Zone {
            id: zone.id,
            name: zone.name,
        })
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<ProviderRecord>> {
        let url = self.url(&format!("/zones/{zone_id}/dns_records"));
        let records: Vec<RecordResult> = self.call(self.client.get(&url), "dns records").await?;
        Ok(records
            .into_iter()
            .map(|r| ProviderRecord {
                id: r.id,
                record_type: r.record_type,
                name: r.name,
                content: r.content,
                proxied: r.proxied,
            })
            .collect())
    }

    async fn create_record(&self, zone_id: &str, spec: &RecordSpec) -> Result<String> {
        tracing::info!(
            "creating {} record {} -> {} (proxied: {})",
            spec.record_type,
            spec.name,
            spec.content,
            spec.proxied
        );

        let url = self.url(&format!("/zones/{zone_id}/dns_records"));
        let payload = serde_json::json!({
            "type": spec.record_type,
            "name": spec.name,
            "content": spec.content,
            "ttl": RECORD_TTL_AUTO,
            "proxied": spec.proxied,
        });

        let record: RecordResult = self
            .call(self.client.post(&url).json(&payload), &spec.name)
            .await?;
        Ok(record.id)
    }

    async fn update_record(&self, zone_id: &str, record_id: &str, content: &str) -> Result<()> {
        tracing::info!("updating record {} -> {}", record_id, content);

        let url = self.url(&format!("/zones/{zone_id}/dns_records/{record_id}"));
        let payload = serde_json::json!({ "content": content });

        let _record: RecordResult = self
            .call(self.client.patch(&url).json(&payload), record_id)
            .await?;
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        tracing::info!("deleting record {}", record_id);

        // A successful delete answers with `{ "result": { "id": ... } }`
        #[derive(Debug, Deserialize)]
        struct DeleteResult {
            #[allow(dead_code)]
            id: String,
        }

        let url = self.url(&format!("/zones/{zone_id}/dns_records/{record_id}"));
        let _result: DeleteResult = self.call(self.client.delete(&url), record_id).await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Whether any structured error entry reports a duplicate record
fn is_duplicate(errors: &[ApiError]) -> bool {
    errors
        .iter()
        .any(|e| DUPLICATE_RECORD_CODES.contains(&e.code))
}

/// Map an HTTP status with no parseable envelope to an error
fn map_http_status(status: u16, subject: &str, body: &str) -> Error {
    match status {
        401 | 403 => Error::provider(
            "cloudflare",
            format!("authentication failed: invalid API token or insufficient permissions (status {status})"),
        ),
        404 => Error::not_found(subject),
        429 => Error::provider(
            "cloudflare",
            format!("rate limit exceeded, retry later (status {status})"),
        ),
        500..=599 => Error::provider(
            "cloudflare",
            format!("server error (transient): {status} - {body}"),
        ),
        _ => Error::provider(
            "cloudflare",
            format!("request for {subject} failed: {status} - {body}"),
        ),
    }
}

/// Map a failed envelope to an error, preferring the structured entries
fn map_api_errors(status: u16, subject: &str, errors: &[ApiError]) -> Error {
    match status {
        401 | 403 => Error::provider(
            "cloudflare",
            format!("authentication failed: invalid API token or insufficient permissions (status {status})"),
        ),
        404 => Error::not_found(subject),
        429 => Error::provider(
            "cloudflare",
            format!("rate limit exceeded, retry later (status {status})"),
        ),
        _ => {
            let detail = errors
                .iter()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            Error::provider(
                "cloudflare",
                format!("request for {subject} failed (status {status}): {detail}"),
            )
        }
    }
}
