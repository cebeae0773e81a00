//! Correlation pipeline regression tests.
//!
//! Drives the correlator's run loop over the in-memory store the way the
//! daemon drives it over Postgres: source signals in, build rows and
//! timeline events out.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use foundry_core::labels::{BUILD_KEY_LABEL, BUILD_STEP_LABEL};
use foundry_core::{BuildEventKind, ContainerEvent, ContainerStatus};
use foundry_correlator::Correlator;
use foundry_source::SourceSignal;
use foundry_store::MemoryStore;

fn notification(status: ContainerStatus, labels: &[(&str, &str)]) -> SourceSignal {
    let attributes: HashMap<String, String> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    SourceSignal::Event(ContainerEvent::new(status, attributes))
}

fn create(build_key: &str, step: &str) -> SourceSignal {
    notification(
        ContainerStatus::Create,
        &[(BUILD_KEY_LABEL, build_key), (BUILD_STEP_LABEL, step)],
    )
}

fn destroy(build_key: &str, step: &str) -> SourceSignal {
    notification(
        ContainerStatus::Destroy,
        &[(BUILD_KEY_LABEL, build_key), (BUILD_STEP_LABEL, step)],
    )
}

/// Handlers are dispatched as tasks, so effects land shortly after the
/// loop exits. Poll instead of guessing a single sleep.
async fn wait_for_events(store: &MemoryStore, n: usize) {
    for _ in 0..100 {
        if store.events().await.len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {n} events, have {}", store.events().await.len());
}

#[tokio::test]
async fn pipeline_records_a_full_build_lifecycle() {
    let store = MemoryStore::new();
    let correlator = Correlator::new(store.clone());

    let (tx, rx) = mpsc::channel(16);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_handle = tokio::spawn(correlator.run(rx, shutdown_rx));

    for step in ["checkout", "compile"] {
        tx.send(create("run-1", step)).await.unwrap();
        tx.send(destroy("run-1", step)).await.unwrap();
    }
    tx.send(SourceSignal::Closed).await.unwrap();
    loop_handle.await.unwrap();

    wait_for_events(&store, 4).await;

    let builds = store.builds().await;
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].build_key, "run-1");

    let events = store.events_for(builds[0].id).await;
    assert_eq!(events.len(), 4);
    let started = events
        .iter()
        .filter(|e| e.kind == BuildEventKind::ContainerStarted)
        .count();
    let stopped = events
        .iter()
        .filter(|e| e.kind == BuildEventKind::ContainerStopped)
        .count();
    assert_eq!(started, 2);
    assert_eq!(stopped, 2);
}

#[tokio::test]
async fn pipeline_keeps_separate_builds_separate() {
    let store = MemoryStore::new();
    let correlator = Correlator::new(store.clone());

    let (tx, rx) = mpsc::channel(16);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_handle = tokio::spawn(correlator.run(rx, shutdown_rx));

    tx.send(create("run-a", "compile")).await.unwrap();
    tx.send(create("run-b", "compile")).await.unwrap();
    tx.send(SourceSignal::Closed).await.unwrap();
    loop_handle.await.unwrap();

    wait_for_events(&store, 2).await;

    let builds = store.builds().await;
    assert_eq!(builds.len(), 2);
    for build in &builds {
        assert_eq!(store.events_for(build.id).await.len(), 1);
    }
}

#[tokio::test]
async fn pipeline_ignores_unmanaged_and_unknown_notifications() {
    let store = MemoryStore::new();
    let correlator = Correlator::new(store.clone());

    let (tx, rx) = mpsc::channel(16);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_handle = tokio::spawn(correlator.run(rx, shutdown_rx));

    // No correlation label.
    tx.send(notification(
        ContainerStatus::Create,
        &[(BUILD_STEP_LABEL, "compile")],
    ))
    .await
    .unwrap();
    // Status outside the correlator's responsibility.
    tx.send(notification(
        ContainerStatus::Other("pause".to_string()),
        &[(BUILD_KEY_LABEL, "run-1")],
    ))
    .await
    .unwrap();
    // One real notification so there is something to wait for.
    tx.send(create("run-2", "compile")).await.unwrap();
    tx.send(SourceSignal::Closed).await.unwrap();
    loop_handle.await.unwrap();

    wait_for_events(&store, 1).await;

    let builds = store.builds().await;
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].build_key, "run-2");
    assert_eq!(store.events().await.len(), 1);
}

#[tokio::test]
async fn pipeline_survives_a_burst_on_one_key() {
    let store = MemoryStore::new();
    let correlator = Correlator::new(store.clone());

    let (tx, rx) = mpsc::channel(64);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_handle = tokio::spawn(correlator.run(rx, shutdown_rx));

    // A burst of create notifications for the same brand-new key; the
    // dispatched handlers race on build creation.
    for i in 0..16 {
        tx.send(create("B1", &format!("step-{i}"))).await.unwrap();
    }
    tx.send(SourceSignal::Closed).await.unwrap();
    loop_handle.await.unwrap();

    wait_for_events(&store, 16).await;

    let builds = store.builds().await;
    assert_eq!(builds.len(), 1, "racing handlers must share one build");

    let events = store.events_for(builds[0].id).await;
    assert_eq!(events.len(), 16);
    assert!(events.iter().all(|e| e.kind == BuildEventKind::ContainerStarted));
}

#[tokio::test]
async fn subsystems_shut_down_cleanly_together() {
    let store = MemoryStore::new();
    let correlator = Correlator::new(store);

    let (_tx, rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sink = foundry_sink::NotificationSink::new("127.0.0.1:0".parse().unwrap());
    let sink_handle = tokio::spawn(sink.serve(shutdown_rx.clone()));
    let loop_handle = tokio::spawn(correlator.run(rx, shutdown_rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();

    loop_handle.await.unwrap();
    assert!(sink_handle.await.unwrap().is_ok());
}
