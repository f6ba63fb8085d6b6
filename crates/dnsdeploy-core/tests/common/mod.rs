// Shared mock collaborators for the engine contract tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dnsdeploy_core::traits::{
    DnsProvider, LivenessProber, ProbeOutcome, ProviderRecord, RecordSpec, TargetResolver, Zone,
};
use dnsdeploy_core::{DeployEngine, EngineEvent, Error, MemoryDeploymentStore, WorkflowConfig};
use tokio::sync::mpsc;

/// Workflow config used across the contract tests: a 30 second budget at a
/// 5 second interval gives exactly 6 polls.
pub fn test_workflow() -> WorkflowConfig {
    WorkflowConfig {
        propagation_timeout_secs: 30,
        poll_interval_secs: 5,
        monitor_interval_secs: 5,
        event_channel_capacity: 64,
    }
}

/// Build an engine over a fresh in-memory store.
pub fn build_engine(
    provider: MockProvider,
    resolver: ScriptedResolver,
    prober: FixedProber,
) -> (DeployEngine, mpsc::Receiver<EngineEvent>) {
    build_engine_with_store(provider, resolver, prober, MemoryDeploymentStore::new())
}

/// Build an engine over a caller-supplied store.
///
/// `MemoryDeploymentStore` is cheaply cloneable, so two engines built over
/// clones of the same store observe each other's records. The contract tests
/// use that to simulate the world changing between workflow runs.
pub fn build_engine_with_store(
    provider: MockProvider,
    resolver: ScriptedResolver,
    prober: FixedProber,
    store: MemoryDeploymentStore,
) -> (DeployEngine, mpsc::Receiver<EngineEvent>) {
    DeployEngine::new(
        Box::new(provider),
        Box::new(resolver),
        Box::new(prober),
        Box::new(store),
        test_workflow(),
    )
    .expect("engine construction with a valid workflow config")
}

/// Mock DNS provider backed by a fixed zone list, with call counters and
/// switchable failure modes.
pub struct MockProvider {
    pub zones: Vec<Zone>,
    pub create_calls: Arc<AtomicUsize>,
    pub update_calls: Arc<AtomicUsize>,
    pub delete_calls: Arc<AtomicUsize>,
    pub fail_create_with_conflict: Arc<AtomicBool>,
    pub fail_update: Arc<AtomicBool>,
    pub fail_delete_with_not_found: Arc<AtomicBool>,
    next_record_id: AtomicUsize,
}

impl MockProvider {
    pub fn with_zone(apex: &str) -> Self {
        Self {
            zones: vec![Zone {
                id: "zone-1".to_string(),
                name: apex.to_string(),
            }],
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            delete_calls: Arc::new(AtomicUsize::new(0)),
            fail_create_with_conflict: Arc::new(AtomicBool::new(false)),
            fail_update: Arc::new(AtomicBool::new(false)),
            fail_delete_with_not_found: Arc::new(AtomicBool::new(false)),
            next_record_id: AtomicUsize::new(1),
        }
    }
}

#[async_trait]
impl DnsProvider for MockProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        Ok(self.zones.clone())
    }

    async fn find_zone(&self, apex: &str) -> Result<Zone, Error> {
        self.zones
            .iter()
            .find(|z| z.name == apex)
            .cloned()
            .ok_or_else(|| Error::zone_not_found(apex))
    }

    async fn list_records(&self, _zone_id: &str) -> Result<Vec<ProviderRecord>, Error> {
        Ok(vec![ProviderRecord {
            id: "record-existing".to_string(),
            record_type: "CNAME".to_string(),
            name: "existing.example.com".to_string(),
            content: "old.manus.space".to_string(),
            proxied: true,
        }])
    }

    async fn create_record(&self, _zone_id: &str, spec: &RecordSpec) -> Result<String, Error> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_with_conflict.load(Ordering::SeqCst) {
            return Err(Error::record_conflict(&spec.name));
        }
        let n = self.next_record_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("record-{n}"))
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        _record_id: &str,
        _content: &str,
    ) -> Result<(), Error> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "update rejected"));
        }
        Ok(())
    }

    async fn delete_record(&self, _zone_id: &str, record_id: &str) -> Result<(), Error> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete_with_not_found.load(Ordering::SeqCst) {
            return Err(Error::not_found(record_id));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Resolver that returns nothing for the first `misses` calls, then resolves
/// to a fixed target forever.
pub struct ScriptedResolver {
    target: Option<String>,
    misses: usize,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    /// Always resolves to `target`
    pub fn resolving(target: &str) -> Self {
        Self::after_misses(target, 0)
    }

    /// Never resolves
    pub fn never() -> Self {
        Self {
            target: None,
            misses: usize::MAX,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resolves to `target` starting with call `misses + 1`
    pub fn after_misses(target: &str, misses: usize) -> Self {
        Self {
            target: Some(target.to_string()),
            misses,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl TargetResolver for ScriptedResolver {
    async fn resolve_target(&self, _hostname: &str) -> Option<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.misses {
            None
        } else {
            self.target.clone()
        }
    }
}

/// Prober that always reports a fixed outcome.
pub struct FixedProber {
    outcome: ProbeOutcome,
    pub calls: Arc<AtomicUsize>,
}

impl FixedProber {
    pub fn live() -> Self {
        Self::with_outcome(ProbeOutcome::with_status(200))
    }

    pub fn dead() -> Self {
        Self::with_outcome(ProbeOutcome::unreachable())
    }

    pub fn status(status: u16) -> Self {
        Self::with_outcome(ProbeOutcome::with_status(status))
    }

    pub fn with_outcome(outcome: ProbeOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl LivenessProber for FixedProber {
    async fn probe(&self, _hostname: &str) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
    }
}
