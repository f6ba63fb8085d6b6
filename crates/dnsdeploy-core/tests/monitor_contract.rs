// Contract tests for the bounded monitor stream.

mod common;

use std::time::Duration;

use common::{FixedProber, MockProvider, ScriptedResolver, build_engine};
use futures::StreamExt;

#[tokio::test(start_paused = true)]
async fn monitor_yields_one_observation_per_interval() {
    let (engine, _rx) = build_engine(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
    );

    // 10s window at a 5s interval: observations at t=0 and t=5, none at t=10
    let observations: Vec<_> = engine
        .monitor("blog.example.com", Duration::from_secs(10))
        .collect()
        .await;

    assert_eq!(observations.len(), 2);
    assert!(observations.iter().all(|o| o.resolved));
    assert!(observations.iter().all(|o| o.http_status == Some(200)));
}

#[tokio::test(start_paused = true)]
async fn monitor_elapsed_is_strictly_increasing() {
    let (engine, _rx) = build_engine(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
    );

    let observations: Vec<_> = engine
        .monitor("blog.example.com", Duration::from_secs(20))
        .collect()
        .await;

    assert_eq!(observations.len(), 4);
    for pair in observations.windows(2) {
        assert!(pair[1].elapsed > pair[0].elapsed);
    }
}

#[tokio::test(start_paused = true)]
async fn monitor_with_zero_duration_yields_nothing() {
    let (engine, _rx) = build_engine(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
    );

    let observations: Vec<_> = engine
        .monitor("blog.example.com", Duration::ZERO)
        .collect()
        .await;
    assert!(observations.is_empty());
}

#[tokio::test(start_paused = true)]
async fn monitor_records_failures_without_stopping() {
    let (engine, _rx) = build_engine(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::never(),
        FixedProber::dead(),
    );

    let observations: Vec<_> = engine
        .monitor("blog.example.com", Duration::from_secs(10))
        .collect()
        .await;

    // A host that never resolves still produces the full set of observations
    assert_eq!(observations.len(), 2);
    assert!(observations.iter().all(|o| !o.resolved));
    assert!(observations.iter().all(|o| o.http_status.is_none()));
}

#[tokio::test(start_paused = true)]
async fn monitor_is_read_only() {
    let (engine, _rx) = build_engine(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
    );

    let _observations: Vec<_> = engine
        .monitor("blog.example.com", Duration::from_secs(10))
        .collect()
        .await;

    assert!(engine.list().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn monitor_is_lazy_until_polled() {
    let prober = FixedProber::live();
    let prober_calls = prober.calls.clone();
    let (engine, _rx) = build_engine(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::resolving("xyz.manus.space"),
        prober,
    );

    let stream = engine.monitor("blog.example.com", Duration::from_secs(10));
    // Constructing the stream performs no probes; only polling it does
    drop(stream);
    assert_eq!(prober_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}
