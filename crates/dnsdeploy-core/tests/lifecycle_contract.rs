// Contract tests for the post-deploy lifecycle: status re-checks, target
// updates and removal.

mod common;

use std::sync::atomic::Ordering;

use common::{FixedProber, MockProvider, ScriptedResolver, build_engine, build_engine_with_store};
use dnsdeploy_core::{DeploymentStatus, Error, MemoryDeploymentStore};

#[tokio::test]
async fn status_of_unknown_name_is_not_found() {
    let (engine, _rx) = build_engine(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::never(),
        FixedProber::dead(),
    );

    let err = engine.status("ghost").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn status_picks_up_late_propagation() {
    let store = MemoryDeploymentStore::new();

    // Deploy while the world is broken: DNS never resolves, site is down
    let (deploy_engine, _rx1) = build_engine_with_store(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::never(),
        FixedProber::dead(),
        store.clone(),
    );
    let record = deploy_engine
        .deploy("blog", "blog.example.com", "xyz.manus.space")
        .await
        .unwrap();
    assert_eq!(record.status, DeploymentStatus::Pending);

    // Later, DNS has propagated and the site answers
    let (check_engine, _rx2) = build_engine_with_store(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
        store.clone(),
    );
    let rechecked = check_engine.status("blog").await.unwrap();
    assert_eq!(rechecked.status, DeploymentStatus::Live);
    assert!(rechecked.dns_propagated);
    assert!(rechecked.site_live);

    // The advance was persisted
    let listed = check_engine.list().await.unwrap();
    assert_eq!(listed[0].status, DeploymentStatus::Live);
}

#[tokio::test(start_paused = true)]
async fn status_refreshes_flags_but_never_downgrades() {
    let store = MemoryDeploymentStore::new();

    let (deploy_engine, _rx1) = build_engine_with_store(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
        store.clone(),
    );
    deploy_engine
        .deploy("blog", "blog.example.com", "xyz.manus.space")
        .await
        .unwrap();

    // The site goes dark and DNS stops resolving
    let (check_engine, _rx2) = build_engine_with_store(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::never(),
        FixedProber::dead(),
        store.clone(),
    );
    let rechecked = check_engine.status("blog").await.unwrap();

    // Flags reflect the current observation; the status high-water mark stays
    assert_eq!(rechecked.status, DeploymentStatus::Live);
    assert!(!rechecked.dns_propagated);
    assert!(!rechecked.site_live);
}

#[tokio::test(start_paused = true)]
async fn update_restarts_the_verification_lifecycle() {
    let provider = MockProvider::with_zone("example.com");
    let update_calls = provider.update_calls.clone();
    let (engine, _rx) = build_engine(
        provider,
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
    );

    let deployed = engine
        .deploy("blog", "blog.example.com", "xyz.manus.space")
        .await
        .unwrap();
    assert_eq!(deployed.status, DeploymentStatus::Live);

    let updated = engine.update("blog", "new.manus.space").await.unwrap();
    assert_eq!(update_calls.load(Ordering::SeqCst), 1);
    assert_eq!(updated.target, "new.manus.space");
    assert_eq!(updated.status, DeploymentStatus::Pending);
    assert!(!updated.dns_propagated);
    assert!(!updated.site_live);
}

#[tokio::test(start_paused = true)]
async fn failed_update_marks_the_record_failed() {
    let provider = MockProvider::with_zone("example.com");
    let fail_update = provider.fail_update.clone();
    let (engine, _rx) = build_engine(
        provider,
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
    );

    engine
        .deploy("blog", "blog.example.com", "xyz.manus.space")
        .await
        .unwrap();

    fail_update.store(true, Ordering::SeqCst);
    let err = engine.update("blog", "new.manus.space").await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));

    let record = engine.list().await.unwrap().remove(0);
    assert_eq!(record.status, DeploymentStatus::Failed);
    // The target was not changed locally since the provider rejected it
    assert_eq!(record.target, "xyz.manus.space");
}

#[tokio::test]
async fn update_of_unknown_name_is_not_found() {
    let provider = MockProvider::with_zone("example.com");
    let update_calls = provider.update_calls.clone();
    let (engine, _rx) = build_engine(
        provider,
        ScriptedResolver::never(),
        FixedProber::dead(),
    );

    let err = engine.update("ghost", "new.manus.space").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn remove_deletes_remote_and_local_and_frees_the_name() {
    let provider = MockProvider::with_zone("example.com");
    let delete_calls = provider.delete_calls.clone();
    let (engine, _rx) = build_engine(
        provider,
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
    );

    engine
        .deploy("blog", "blog.example.com", "xyz.manus.space")
        .await
        .unwrap();
    engine.remove("blog").await.unwrap();

    assert_eq!(delete_calls.load(Ordering::SeqCst), 1);
    assert!(engine.list().await.unwrap().is_empty());

    // The name is free again
    engine
        .deploy("blog", "blog.example.com", "xyz.manus.space")
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn remove_tolerates_an_already_deleted_remote_record() {
    let provider = MockProvider::with_zone("example.com");
    let fail_delete = provider.fail_delete_with_not_found.clone();
    let (engine, _rx) = build_engine(
        provider,
        ScriptedResolver::resolving("xyz.manus.space"),
        FixedProber::live(),
    );

    engine
        .deploy("blog", "blog.example.com", "xyz.manus.space")
        .await
        .unwrap();

    fail_delete.store(true, Ordering::SeqCst);
    engine.remove("blog").await.unwrap();
    assert!(engine.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_of_unknown_name_is_not_found() {
    let provider = MockProvider::with_zone("example.com");
    let delete_calls = provider.delete_calls.clone();
    let (engine, _rx) = build_engine(
        provider,
        ScriptedResolver::never(),
        FixedProber::dead(),
    );

    let err = engine.remove("ghost").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn listings_pass_through_to_the_provider() {
    let (engine, _rx) = build_engine(
        MockProvider::with_zone("example.com"),
        ScriptedResolver::never(),
        FixedProber::dead(),
    );

    let zones = engine.zones().await.unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].name, "example.com");

    let records = engine.records("blog.example.com").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_type, "CNAME");
}
