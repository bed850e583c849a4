//! Store and distribution tests.
//!
//! These drive the store's read and watch surface the way a distribution
//! layer would: watch a type, read resources at the notified version, push
//! them to proxies and feed their acknowledgements back to the tracker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use xds_push::prelude::*;

use crate::fixtures::*;

/// A simulated proxy that applies every cluster version it is sent,
/// rejecting clusters whose connect timeout is zero.
async fn run_proxy(tracker: Arc<AckTracker>, proxy: NodeId, mut versions: VersionWatch) {
    let mut applied = 0;
    while let Some(version) = versions.recv().await {
        let snapshot = tracker.mutator().get_resources(TypeUrl::CLUSTER, &[]);
        if snapshot.version < version {
            continue;
        }
        let names: Vec<String> = snapshot.resources.iter().map(|r| r.name().to_string()).collect();
        let invalid = snapshot.resources.iter().any(|r| {
            r.as_any()
                .downcast_ref::<Cluster>()
                .is_some_and(|c| c.connect_timeout_ms == 0)
        });

        if invalid {
            nack(&tracker, &proxy, TypeUrl::CLUSTER, applied, snapshot.version, &names, "connect_timeout must be positive");
        } else {
            applied = snapshot.version;
            ack(&tracker, &proxy, TypeUrl::CLUSTER, applied, &names);
        }
    }
}

#[tokio::test]
async fn distribution_loop_acks_pushes() {
    init_tracing();
    let store = Arc::new(VersionedStore::new());
    let tracker = Arc::new(AckTracker::new(Arc::clone(&store)));
    let proxies = proxies(3);

    let tasks: Vec<_> = proxies
        .iter()
        .map(|proxy| tokio::spawn(run_proxy(Arc::clone(&tracker), proxy.clone(), store.watch(TypeUrl::CLUSTER))))
        .collect();

    let wg = WaitGroup::with_timeout(Duration::from_secs(10));
    let _ = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 250), &proxies, Some(&wg), None);
    let _ = tracker.upsert(TypeUrl::CLUSTER, "bar/baz", cluster("bar/baz", 500), &proxies, Some(&wg), None);
    assert_eq!(wg.wait().await, Ok(()));

    let wg = WaitGroup::with_timeout(Duration::from_secs(10));
    let revert = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 0), &proxies, Some(&wg), None);
    let err = wg.wait().await.unwrap_err();
    assert_eq!(err.detail(), Some("connect_timeout must be positive"));

    let wg = WaitGroup::with_timeout(Duration::from_secs(10));
    tracker.revert(revert, Some(wg.add_completion()));
    assert_eq!(wg.wait().await, Ok(()));

    for proxy in &proxies {
        assert_eq!(tracker.acked_version(proxy.as_str()), Some(4));
    }

    for task in tasks {
        task.abort();
    }
}

#[tokio::test]
async fn reads_see_consistent_versions() {
    let store = Arc::new(VersionedStore::new());
    let tracker = AckTracker::new(Arc::clone(&store));

    let _ = tracker.upsert(TypeUrl::CLUSTER, "a", cluster("a", 1), &[], None, None);
    let _ = tracker.upsert(TypeUrl::LISTENER, "http", listener("http", 1), &[], None, None);
    let _ = tracker.upsert(TypeUrl::CLUSTER, "b", cluster("b", 1), &[], None, None);

    let clusters = store.get_resources(TypeUrl::CLUSTER, &[]);
    assert_eq!(clusters.version, 3);
    assert_eq!(clusters.resources.len(), 2);

    let listeners = store.get_resources(TypeUrl::LISTENER, &names(&["http", "https"]));
    assert_eq!(listeners.version, 3);
    assert_eq!(listeners.resources.len(), 1);

    assert_eq!(store.resource_names(TypeUrl::CLUSTER), vec!["a", "b"]);
    assert_eq!(store.len(), 3);
    assert_eq!(store.stats().upserts(), 3);
}

#[tokio::test]
async fn watches_only_see_their_type() {
    let store = Arc::new(VersionedStore::new());
    let tracker = AckTracker::new(Arc::clone(&store));
    let mut clusters = store.watch(TypeUrl::CLUSTER);
    let mut listeners = store.watch(TypeUrl::LISTENER);

    let _ = tracker.upsert(TypeUrl::CLUSTER, "a", cluster("a", 1), &[], None, None);
    let _ = tracker.upsert(TypeUrl::LISTENER, "http", listener("http", 1), &[], None, None);
    let _ = tracker.upsert(TypeUrl::CLUSTER, "a", cluster("a", 1), &[], None, None);
    let _ = tracker.delete(TypeUrl::CLUSTER, "a", &[], None, None);

    assert_eq!(clusters.recv().await, Some(1));
    assert_eq!(clusters.recv().await, Some(3));
    assert!(clusters.try_recv().is_err());
    assert_eq!(listeners.recv().await, Some(2));
    assert!(listeners.try_recv().is_err());

    assert!(store.cancel_watch(listeners.id()));
    assert_eq!(store.watches().total_watch_count(), 1);
}

#[tokio::test]
async fn sweeper_bounds_abandoned_completions() {
    let tracker = Arc::new(
        AckTracker::builder()
            .mutator(Arc::new(VersionedStore::new()))
            .sweep_interval(Duration::from_millis(20))
            .build()
            .unwrap(),
    );
    let (shutdown, shutdown_rx) = watch::channel(false);
    let sweeper = tracker
        .spawn_configured_sweeper(shutdown_rx)
        .expect("sweep interval is configured");

    let proxies = proxies(1);
    for i in 0..10 {
        let wg = WaitGroup::new();
        let name = format!("c-{i}");
        let _ = tracker.upsert(TypeUrl::CLUSTER, &name, cluster(&name, 1), &proxies, Some(&wg), None);
        wg.cancel();
    }
    assert_eq!(tracker.pending_count(), 10);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tracker.pending_count() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(tracker.pending_count(), 0);

    shutdown.send(true).unwrap();
    sweeper.await.unwrap();
}
