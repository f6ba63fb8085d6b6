// # Verification Probes
//
// Live implementations of the two verification collaborators:
//
// - `HickoryTargetResolver`: checks DNS propagation by querying the CNAME
//   chain of a hostname with hickory-resolver
// - `HttpLivenessProber`: checks liveness with a single HTTPS GET
//
// Both downgrade transport failures to "not observed" outcomes. During
// propagation a hostname that does not resolve yet is the expected case, so
// neither probe ever raises an error.

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::RecordType;

use dnsdeploy_core::traits::{LivenessProber, ProbeOutcome, TargetResolver};

/// Default timeout for one liveness probe request
const PROBE_TIMEOUT_SECS: u64 = 10;

/// DNS target resolver backed by hickory-resolver
///
/// Queries the CNAME of the hostname and reports its canonical destination.
/// A hostname with no CNAME that still resolves to an address reports itself,
/// so proxied records (where the provider flattens the CNAME at the edge)
/// still count as propagated.
pub struct HickoryTargetResolver {
    resolver: TokioResolver,
}

impl HickoryTargetResolver {
    /// Create a resolver using Cloudflare's public nameservers
    ///
    /// Propagation checks deliberately bypass the system resolver; a local
    /// cache would keep reporting stale answers for the whole poll budget.
    pub fn new() -> Self {
        let mut opts = ResolverOpts::default();
        // Each poll must see the authoritative world, not a prior answer
        opts.cache_size = 0;

        let resolver =
            TokioResolver::builder_with_config(ResolverConfig::cloudflare(), TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Self { resolver }
    }
}

impl Default for HickoryTargetResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetResolver for HickoryTargetResolver {
    async fn resolve_target(&self, hostname: &str) -> Option<String> {
        match self.resolver.lookup(hostname, RecordType::CNAME).await {
            Ok(response) => {
                if let Some(cname) = response
                    .record_iter()
                    .find_map(|record| record.data().as_cname())
                {
                    return Some(normalize(&cname.0.to_string()));
                }
                // Resolved, but not via CNAME (flattened at the edge)
                Some(normalize(hostname))
            }
            Err(e) => {
                tracing::debug!("{} does not resolve yet: {}", hostname, e);
                // Fall back to an address lookup before giving up
                match self.resolver.lookup_ip(hostname).await {
                    Ok(ips) if ips.iter().next().is_some() => Some(normalize(hostname)),
                    _ => None,
                }
            }
        }
    }
}

/// Strip the trailing dot resolvers append to absolute names
fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// HTTP liveness prober backed by reqwest
///
/// Issues one `GET https://{hostname}/` per probe. Redirects are not
/// followed; a 3xx answer already proves the site is being served.
pub struct HttpLivenessProber {
    client: reqwest::Client,
}

impl HttpLivenessProber {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpLivenessProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LivenessProber for HttpLivenessProber {
    async fn probe(&self, hostname: &str) -> ProbeOutcome {
        let url = format!("https://{hostname}/");
        match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::debug!("probe {} -> {}", url, status);
                ProbeOutcome::with_status(status)
            }
            Err(e) => {
                tracing::debug!("probe {} failed: {}", url, e);
                ProbeOutcome::unreachable()
            }
        }
    }
}
