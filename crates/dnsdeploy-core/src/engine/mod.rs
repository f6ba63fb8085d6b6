//! Deployment workflow engine
//!
//! The DeployEngine is responsible for:
//! - Creating DNS records via the DnsProvider
//! - Polling DNS resolution until propagation is observed (or the budget runs out)
//! - Probing HTTP liveness
//! - Persisting every status change through the DeploymentStore
//!
//! ## Architecture
//!
//! ```text
//!                       ┌──────────────┐
//!        caller ───────▶│ DeployEngine │──── EngineEvent ───▶ (progress)
//!                       └──────────────┘
//!                               │
//!         ┌─────────────────────┼──────────────────────┬──────────────┐
//!         ▼                     ▼                      ▼              ▼
//! ┌──────────────┐     ┌────────────────┐     ┌────────────────┐ ┌───────┐
//! │ DnsProvider  │     │ TargetResolver │     │ LivenessProber │ │ Store │
//! │ (create/del) │     │ (propagation)  │     │ (HTTP check)   │ │(CRUD) │
//! └──────────────┘     └────────────────┘     └────────────────┘ └───────┘
//! ```
//!
//! ## Deploy Flow
//!
//! 1. Reject the name if it is already tracked
//! 2. Resolve the zone apex and look up the zone at the provider
//! 3. Create the CNAME record; insert a Pending deployment record
//! 4. Poll DNS resolution at `poll_interval` up to `propagation_timeout`,
//!    exiting early on a match (polling timeouts are not failures)
//! 5. Probe HTTP liveness once; 2xx/3xx marks the deployment Live
//!
//! All suspension happens at the polling sleeps; the engine is otherwise
//! sequential, with one workflow in flight at a time.

use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::error::{Error, Result};
use crate::traits::{
    DeploymentRecord, DeploymentStatus, DeploymentStore, DnsProvider, LivenessProber,
    ProviderRecord, TargetResolver, Zone,
};

/// Events emitted by the DeployEngine for progress reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Zone lookup succeeded
    ZoneResolved {
        zone_name: String,
        zone_id: String,
    },

    /// Provider record created
    RecordCreated {
        name: String,
        record_id: String,
    },

    /// One propagation poll completed
    PropagationPoll {
        attempt: u64,
        matched: bool,
    },

    /// DNS resolution matched the expected target
    DnsPropagated {
        polls: u64,
    },

    /// The polling budget ran out without a match (not a failure)
    PropagationTimedOut {
        polls: u64,
    },

    /// The liveness probe completed
    LivenessProbed {
        status: Option<u16>,
        live: bool,
    },

    /// Provider record content updated
    RecordUpdated {
        name: String,
        target: String,
    },

    /// Deployment removed
    RecordRemoved {
        name: String,
    },
}

/// One observation from the monitor stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Wall-clock time of the observation
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Time since the monitor started; strictly increasing across the stream
    pub elapsed: Duration,
    /// Whether the hostname currently resolves
    pub resolved: bool,
    /// HTTP status of the liveness probe, when a response was received
    pub http_status: Option<u16>,
}

/// Deployment workflow engine
///
/// Construct with [`DeployEngine::new`], then drive it with [`deploy`],
/// [`status`], [`update`], [`remove`], [`list`] and [`monitor`].
///
/// [`deploy`]: DeployEngine::deploy
/// [`status`]: DeployEngine::status
/// [`update`]: DeployEngine::update
/// [`remove`]: DeployEngine::remove
/// [`list`]: DeployEngine::list
/// [`monitor`]: DeployEngine::monitor
pub struct DeployEngine {
    /// DNS provider for record management
    provider: Box<dyn DnsProvider>,

    /// DNS resolver for propagation checks
    resolver: Box<dyn TargetResolver>,

    /// HTTP prober for liveness checks
    prober: Box<dyn LivenessProber>,

    /// Deployment store, the single owner of record lifecycle
    store: Box<dyn DeploymentStore>,

    /// Polling policy
    workflow: WorkflowConfig,

    /// Event sender for external progress reporting
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DeployEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where the receiver yields
    /// progress events. Dropping the receiver is fine; events are then
    /// discarded.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        resolver: Box<dyn TargetResolver>,
        prober: Box<dyn LivenessProber>,
        store: Box<dyn DeploymentStore>,
        workflow: WorkflowConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        workflow.validate()?;

        let (tx, rx) = mpsc::channel(workflow.event_channel_capacity);

        let engine = Self {
            provider,
            resolver,
            prober,
            store,
            workflow,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Deploy a new custom domain
    ///
    /// Creates the CNAME record at the provider, tracks it in the store,
    /// waits for propagation within the configured budget, then performs a
    /// single liveness check.
    ///
    /// # Errors
    ///
    /// - [`Error::RecordConflict`]: `name` is already tracked, or the
    ///   provider reported a duplicate record
    /// - [`Error::ZoneNotFound`]: no zone covers `custom_domain`
    /// - [`Error::Provider`]: any other provider API failure
    ///
    /// Verification shortfalls after the record exists (propagation timeout,
    /// dead site) are recorded in the returned record, not raised.
    pub async fn deploy(
        &self,
        name: &str,
        custom_domain: &str,
        target: &str,
    ) -> Result<DeploymentRecord> {
        if self.store.get(name).await?.is_some() {
            return Err(Error::record_conflict(name));
        }

        let apex = zone_apex(custom_domain)?;
        debug!("resolving zone for apex {}", apex);
        let zone = self.provider.find_zone(&apex).await?;
        self.emit(EngineEvent::ZoneResolved {
            zone_name: zone.name.clone(),
            zone_id: zone.id.clone(),
        });

        let spec = crate::traits::RecordSpec::cname(custom_domain, target).proxied(true);
        let record_id = self.provider.create_record(&zone.id, &spec).await?;
        info!(
            "created {} record {} -> {} (id {})",
            spec.record_type, custom_domain, target, record_id
        );
        self.emit(EngineEvent::RecordCreated {
            name: name.to_string(),
            record_id: record_id.clone(),
        });

        let mut record = DeploymentRecord::new(name, custom_domain, target, record_id, zone.id);
        self.store.insert(record.clone()).await?;

        self.await_propagation(&mut record).await;
        record.touch();
        self.store.put(record.clone()).await?;

        self.check_liveness(&mut record).await;
        record.touch();
        self.store.put(record.clone()).await?;
        self.store.flush().await?;

        Ok(record)
    }

    /// Re-check a tracked deployment
    ///
    /// Re-queries DNS resolution and liveness, refreshes the flags and
    /// advances the status (never backwards), persists and returns the
    /// record.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `name` is untracked; the store is not touched
    /// in that case.
    pub async fn status(&self, name: &str) -> Result<DeploymentRecord> {
        let mut record = self
            .store
            .get(name)
            .await?
            .ok_or_else(|| Error::not_found(name))?;

        let resolved = self.resolver.resolve_target(&record.custom_domain).await;
        record.dns_propagated = resolved
            .as_deref()
            .is_some_and(|t| resolution_confirms(t, &record.target, &record.custom_domain));
        if record.dns_propagated {
            record.advance(DeploymentStatus::Propagated);
        }

        let outcome = self.prober.probe(&record.custom_domain).await;
        record.site_live = outcome.is_live();
        if record.site_live {
            record.advance(DeploymentStatus::Live);
        }
        self.emit(EngineEvent::LivenessProbed {
            status: outcome.status,
            live: record.site_live,
        });

        record.touch();
        self.store.put(record.clone()).await?;
        Ok(record)
    }

    /// Re-point a tracked deployment at a new target
    ///
    /// Updates the provider record content, then resets the verification
    /// flags: the deployment returns to Pending and must propagate again.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`]: `name` is untracked
    /// - [`Error::Provider`]: the provider rejected the update; the record
    ///   is marked Failed before the error is surfaced
    pub async fn update(&self, name: &str, new_target: &str) -> Result<DeploymentRecord> {
        let mut record = self
            .store
            .get(name)
            .await?
            .ok_or_else(|| Error::not_found(name))?;

        match self
            .provider
            .update_record(
                &record.provider_zone_id,
                &record.provider_record_id,
                new_target,
            )
            .await
        {
            Ok(()) => {
                info!("updated {} -> {}", record.custom_domain, new_target);
                record.target = new_target.to_string();
                record.dns_propagated = false;
                record.site_live = false;
                // Re-pointing restarts the verification lifecycle
                record.status = DeploymentStatus::Pending;
                record.touch();
                self.store.put(record.clone()).await?;
                self.emit(EngineEvent::RecordUpdated {
                    name: name.to_string(),
                    target: new_target.to_string(),
                });
                Ok(record)
            }
            Err(e) => {
                warn!("provider update failed for {}: {}", name, e);
                record.status = DeploymentStatus::Failed;
                record.touch();
                // Surface the provider error even if the status write fails
                if let Err(store_err) = self.store.put(record).await {
                    warn!("failed to record Failed status for {}: {}", name, store_err);
                }
                Err(e)
            }
        }
    }

    /// Remove a tracked deployment
    ///
    /// Deletes the provider record best-effort (a missing remote record is
    /// not an error; other provider failures are logged and do not block),
    /// then deletes the local row. The name is free for re-use afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `name` is untracked.
    pub async fn remove(&self, name: &str) -> Result<()> {
        let record = self
            .store
            .get(name)
            .await?
            .ok_or_else(|| Error::not_found(name))?;

        match self
            .provider
            .delete_record(&record.provider_zone_id, &record.provider_record_id)
            .await
        {
            Ok(()) => debug!("deleted provider record for {}", record.custom_domain),
            Err(e) if e.is_not_found() => {
                debug!("provider record for {} already gone", record.custom_domain);
            }
            Err(e) => {
                warn!(
                    "could not delete provider record for {}: {} (leaving it behind)",
                    record.custom_domain, e
                );
            }
        }

        self.store.delete(name).await?;
        self.store.flush().await?;
        self.emit(EngineEvent::RecordRemoved {
            name: name.to_string(),
        });
        Ok(())
    }

    /// List all tracked deployments
    pub async fn list(&self) -> Result<Vec<DeploymentRecord>> {
        self.store.list_all().await
    }

    /// List all zones at the provider
    pub async fn zones(&self) -> Result<Vec<Zone>> {
        self.provider.list_zones().await
    }

    /// List the provider's DNS records for the zone covering `domain`
    pub async fn records(&self, domain: &str) -> Result<Vec<ProviderRecord>> {
        let apex = zone_apex(domain)?;
        let zone = self.provider.find_zone(&apex).await?;
        self.provider.list_records(&zone.id).await
    }

    /// Monitor a domain for a bounded duration
    ///
    /// Returns a lazy, finite, non-restartable stream of observations, one
    /// per monitor interval, until `duration` expires. Does not mutate the
    /// store.
    pub fn monitor(
        &self,
        domain: impl Into<String>,
        duration: Duration,
    ) -> impl Stream<Item = Observation> + Send + '_ {
        let domain = domain.into();
        let interval = self.workflow.monitor_interval();
        let started = tokio::time::Instant::now();
        let deadline = started + duration;

        futures::stream::unfold(true, move |first| {
            let domain = domain.clone();
            async move {
                if !first {
                    tokio::time::sleep(interval).await;
                }
                if tokio::time::Instant::now() >= deadline {
                    return None;
                }

                let resolved = self.resolver.resolve_target(&domain).await.is_some();
                let outcome = self.prober.probe(&domain).await;

                let observation = Observation {
                    timestamp: chrono::Utc::now(),
                    elapsed: started.elapsed(),
                    resolved,
                    http_status: outcome.status,
                };
                Some((observation, false))
            }
        })
    }

    /// Poll DNS resolution until the target matches or the budget runs out
    ///
    /// Exits early on the first match. Exhausting the budget leaves the
    /// record Pending with `dns_propagated = false`; the caller proceeds to
    /// the liveness check regardless.
    async fn await_propagation(&self, record: &mut DeploymentRecord) {
        let max_polls = self.workflow.max_polls();
        let interval = self.workflow.poll_interval();
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            let resolved = self.resolver.resolve_target(&record.custom_domain).await;
            let matched = resolved
                .as_deref()
                .is_some_and(|t| resolution_confirms(t, &record.target, &record.custom_domain));
            self.emit(EngineEvent::PropagationPoll { attempt, matched });

            if matched {
                info!(
                    "DNS propagated for {} after {} poll(s)",
                    record.custom_domain, attempt
                );
                record.dns_propagated = true;
                record.advance(DeploymentStatus::Propagated);
                self.emit(EngineEvent::DnsPropagated { polls: attempt });
                return;
            }

            if attempt >= max_polls {
                info!(
                    "DNS for {} still propagating after {} poll(s); this can take longer",
                    record.custom_domain, attempt
                );
                record.dns_propagated = false;
                self.emit(EngineEvent::PropagationTimedOut { polls: attempt });
                return;
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// Perform the single post-deploy liveness check
    async fn check_liveness(&self, record: &mut DeploymentRecord) {
        let outcome = self.prober.probe(&record.custom_domain).await;
        record.site_live = outcome.is_live();
        if record.site_live {
            record.advance(DeploymentStatus::Live);
        }
        self.emit(EngineEvent::LivenessProbed {
            status: outcome.status,
            live: record.site_live,
        });
    }

    /// Emit a progress event, dropping it if the channel is full
    fn emit(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            // Receiver is slow or gone; the workflow must not block on it
            debug!("event channel full or closed, dropping event");
        }
    }
}

/// Whether a resolved answer confirms the record has propagated
///
/// Direct CNAME answers match `target`. A proxied record is flattened at the
/// provider's edge: the domain answers with the provider's own addresses and
/// no CNAME is visible, so the resolver reports the domain itself. That
/// observation still proves the record is serving.
fn resolution_confirms(resolved: &str, target: &str, custom_domain: &str) -> bool {
    targets_match(resolved, target) || targets_match(resolved, custom_domain)
}

/// Derive the zone apex from a fully-qualified domain name
///
/// For "blog.example.com" this is "example.com". Compound public suffixes
/// like .co.uk are handled heuristically by keeping three labels when the
/// second-to-last label is three characters or fewer. The heuristic
/// overreaches for zones whose own second-level label is that short (a zone
/// `abc.com` hosting `blog.abc.com` derives `blog.abc.com` and the lookup
/// fails); configure an explicit zone ID to bypass discovery in that case.
pub fn zone_apex(domain: &str) -> Result<String> {
    let parts: Vec<&str> = domain.split('.').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return Err(Error::invalid_input(format!(
            "invalid domain name: {domain}"
        )));
    }

    let apex = if parts.len() >= 3 && parts[parts.len() - 2].len() <= 3 {
        format!(
            "{}.{}.{}",
            parts[parts.len() - 3],
            parts[parts.len() - 2],
            parts[parts.len() - 1]
        )
    } else {
        format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1])
    };
    Ok(apex)
}

/// Compare a resolved target against the expected one
///
/// Resolvers commonly return names with a trailing dot; DNS names are
/// case-insensitive.
fn targets_match(resolved: &str, expected: &str) -> bool {
    resolved
        .trim_end_matches('.')
        .eq_ignore_ascii_case(expected.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apex_of_simple_subdomain() {
        assert_eq!(zone_apex("blog.example.com").unwrap(), "example.com");
        assert_eq!(zone_apex("example.com").unwrap(), "example.com");
        assert_eq!(zone_apex("deep.nested.example.com").unwrap(), "example.com");
    }

    #[test]
    fn apex_of_compound_suffix() {
        assert_eq!(zone_apex("www.example.co.uk").unwrap(), "example.co.uk");
    }

    #[test]
    fn apex_of_bare_label_is_rejected() {
        assert!(zone_apex("localhost").is_err());
        assert!(zone_apex("").is_err());
    }

    #[test]
    fn target_matching_ignores_case_and_trailing_dot() {
        assert!(targets_match("XYZ.Manus.Space.", "xyz.manus.space"));
        assert!(targets_match("xyz.manus.space", "xyz.manus.space"));
        assert!(!targets_match("other.manus.space", "xyz.manus.space"));
    }

    #[test]
    fn flattened_answers_confirm_resolution() {
        // CNAME answer
        assert!(resolution_confirms(
            "xyz.manus.space",
            "xyz.manus.space",
            "blog.example.com"
        ));
        // Proxied record flattened at the edge: the domain answers for itself
        assert!(resolution_confirms(
            "blog.example.com.",
            "xyz.manus.space",
            "blog.example.com"
        ));
        assert!(!resolution_confirms(
            "other.example.com",
            "xyz.manus.space",
            "blog.example.com"
        ));
    }
}
