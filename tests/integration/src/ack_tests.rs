//! ACK/NACK scenario tests.

use std::sync::Arc;
use std::time::Duration;

use xds_push::prelude::*;

use crate::fixtures::*;

fn tracker() -> AckTracker {
    AckTracker::new(Arc::new(VersionedStore::new()))
}

#[tokio::test]
async fn second_proxy_ack_completes_push() {
    init_tracing();
    let tracker = tracker();
    for i in 0..4 {
        let name = format!("listener-{i}");
        let _ = tracker.upsert(TypeUrl::LISTENER, &name, listener(&name, 0), &[], None, None);
    }
    let proxies = [NodeId::new("10.0.0.1"), NodeId::new("10.0.0.2")];
    let wg = WaitGroup::new();
    let (callback, outcomes) = recorder();

    let _revert = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 250), &proxies, Some(&wg), Some(callback));
    assert_eq!(tracker.version(), 5);

    tracker.handle_resource_version_ack(5, 5, "10.0.0.1", &names(&["bar/foo"]), TypeUrl::CLUSTER, "");
    assert!(outcomes.lock().unwrap().is_empty());

    tracker.handle_resource_version_ack(5, 5, "10.0.0.2", &names(&["bar/foo"]), TypeUrl::CLUSTER, "");
    assert_eq!(*outcomes.lock().unwrap(), vec![Ok(())]);
    assert_eq!(wg.wait().await, Ok(()));
}

#[tokio::test]
async fn nack_from_one_proxy_fails_push() {
    let tracker = tracker();
    let proxies = proxies(3);
    let wg = WaitGroup::new();
    let foo = names(&["bar/foo"]);

    let revert = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 250), &proxies, Some(&wg), None);
    ack(&tracker, &proxies[0], TypeUrl::CLUSTER, 1, &foo);
    ack(&tracker, &proxies[1], TypeUrl::CLUSTER, 1, &foo);
    nack(&tracker, &proxies[2], TypeUrl::CLUSTER, 0, 1, &foo, "connect_timeout: value out of range");

    let err = wg.wait().await.unwrap_err();
    assert_eq!(err.detail(), Some("connect_timeout: value out of range"));
    assert_eq!(
        err.to_string(),
        "NACK received: connect_timeout: value out of range"
    );

    let xds_err: XdsError = err.into();
    assert!(xds_err.is_nack());

    // Roll back and wait for every proxy to pick up the rollback.
    let rollback = wg.add_completion();
    tracker.revert(revert, Some(rollback.clone()));
    assert!(tracker.mutator().get(TypeUrl::CLUSTER, "bar/foo").is_none());
    for proxy in &proxies {
        ack(&tracker, proxy, TypeUrl::CLUSTER, 2, &[]);
    }
    assert_eq!(rollback.result(), Some(Ok(())));
}

#[tokio::test]
async fn newer_ack_covers_older_versions() {
    let tracker = tracker();
    let proxies = proxies(1);
    let wg = WaitGroup::new();

    for timeout in [100, 200, 300] {
        let _ = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", timeout), &proxies, Some(&wg), None);
    }
    assert_eq!(tracker.pending_count(), 3);

    ack(&tracker, &proxies[0], TypeUrl::CLUSTER, 3, &names(&["bar/foo"]));
    assert_eq!(tracker.pending_count(), 0);
    assert_eq!(wg.wait().await, Ok(()));
}

#[tokio::test]
async fn nack_resolves_versions_between_ack_and_nonce() {
    let tracker = tracker();
    let proxies = proxies(1);
    let foo = names(&["bar/foo"]);

    let first = WaitGroup::new();
    let _ = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 100), &proxies, Some(&first), None);
    let second = WaitGroup::new();
    let _ = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 200), &proxies, Some(&second), None);
    let third = WaitGroup::new();
    let _ = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 300), &proxies, Some(&third), None);

    // The proxy applied 1, then rejected 2. Version 3 was never attempted.
    nack(&tracker, &proxies[0], TypeUrl::CLUSTER, 1, 2, &foo, "rejected");
    assert_eq!(first.wait().await, Ok(()));
    assert!(second.wait().await.unwrap_err().is_nack());
    assert_eq!(tracker.pending_count(), 1);

    ack(&tracker, &proxies[0], TypeUrl::CLUSTER, 3, &foo);
    assert_eq!(third.wait().await, Ok(()));
}

#[tokio::test]
async fn restore_then_resume() {
    let tracker = AckTracker::builder()
        .mutator(Arc::new(VersionedStore::new()))
        .start_restoring(true)
        .build()
        .unwrap();
    let proxies = proxies(2);

    // Restoring: state from before a restart is loaded without waiting.
    let restore = WaitGroup::new();
    for i in 0..10 {
        let name = format!("cluster-{i}");
        let _ = tracker.upsert(TypeUrl::CLUSTER, &name, cluster(&name, 100), &proxies, Some(&restore), None);
    }
    assert_eq!(restore.pending_count(), 0);
    assert_eq!(tracker.pending_count(), 0);
    assert_eq!(restore.wait().await, Ok(()));

    tracker.mark_restore_completed();

    let wg = WaitGroup::new();
    tracker.use_current(TypeUrl::CLUSTER, &proxies, Some(&wg));
    assert_eq!(wg.pending_count(), 1);
    for proxy in &proxies {
        ack(&tracker, proxy, TypeUrl::CLUSTER, 10, &[]);
    }
    assert_eq!(wg.wait().await, Ok(()));
}

#[tokio::test(start_paused = true)]
async fn silent_proxy_times_out() {
    let tracker = tracker();
    let proxies = proxies(2);
    let wg = WaitGroup::with_timeout(Duration::from_secs(5));
    let (callback, outcomes) = recorder();

    let revert = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 100), &proxies, Some(&wg), Some(callback));
    ack(&tracker, &proxies[0], TypeUrl::CLUSTER, 1, &names(&["bar/foo"]));

    assert_eq!(wg.wait().await, Err(CompletionError::DeadlineExceeded));
    // An abandoned completion never calls back.
    assert!(outcomes.lock().unwrap().is_empty());
    assert_eq!(tracker.sweep_canceled(), 1);

    tracker.revert(revert, None);
    assert_eq!(tracker.version(), 2);
}

#[tokio::test]
async fn revert_list_rolls_back_a_transaction() {
    let tracker = tracker();
    let proxies = proxies(2);
    let _ = tracker.upsert(TypeUrl::CLUSTER, "a", cluster("a", 1), &proxies, None, None);

    let mut transaction = RevertList::new();
    transaction.push(tracker.upsert(TypeUrl::CLUSTER, "a", cluster("a", 2), &proxies, None, None));
    transaction.push(tracker.upsert(TypeUrl::CLUSTER, "b", cluster("b", 1), &proxies, None, None));
    transaction.push(tracker.delete(TypeUrl::CLUSTER, "missing", &proxies, None, None));
    assert_eq!(tracker.version(), 3);

    let wg = WaitGroup::new();
    transaction.revert_all(&tracker, Some(&wg));
    assert_eq!(wg.pending_count(), 3);
    assert_eq!(tracker.version(), 5);

    let store = tracker.mutator();
    assert!(store.get(TypeUrl::CLUSTER, "b").is_none());
    let a = store.get(TypeUrl::CLUSTER, "a").unwrap();
    let a = a.as_any().downcast_ref::<crate::fixtures::Cluster>().unwrap();
    assert_eq!(a.connect_timeout_ms, 1);

    for proxy in &proxies {
        ack(&tracker, proxy, TypeUrl::CLUSTER, 5, &[]);
    }
    assert_eq!(wg.wait().await, Ok(()));
}

#[test]
fn acked_versions_never_decrease() {
    let tracker = tracker();
    let proxy = NodeId::new("10.0.0.1");
    let reports = [3, 1, 7, 7, 2, 9, 0, 8];

    let mut highest = 0;
    for version in reports {
        ack(&tracker, &proxy, TypeUrl::CLUSTER, version, &[]);
        highest = highest.max(version);
        assert_eq!(tracker.acked_version(proxy.as_str()), Some(highest));
    }
}

#[test]
fn versions_increase_only_on_change() {
    let tracker = tracker();
    let proxies = proxies(1);
    let mut expected = 0;

    let ops: [(&str, Option<u32>); 8] = [
        ("a", Some(1)),
        ("a", Some(1)),
        ("b", Some(1)),
        ("a", Some(2)),
        ("c", None),
        ("b", None),
        ("b", None),
        ("a", Some(2)),
    ];
    for (name, value) in ops {
        let handle = match value {
            Some(value) => tracker.upsert(TypeUrl::CLUSTER, name, cluster(name, value), &proxies, None, None),
            None => tracker.delete(TypeUrl::CLUSTER, name, &proxies, None, None),
        };
        if !handle.is_noop() {
            expected += 1;
        }
        assert_eq!(tracker.version(), expected);
    }
    assert_eq!(expected, 4);
}

#[tokio::test]
async fn proxies_ack_concurrently() {
    let tracker = Arc::new(tracker());
    let proxies = proxies(32);
    let wg = WaitGroup::new();
    let _ = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 1), &proxies, Some(&wg), None);

    let reports = proxies.iter().cloned().map(|proxy| {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move {
            ack(&tracker, &proxy, TypeUrl::CLUSTER, 1, &names(&["bar/foo"]));
        })
    });
    for result in futures::future::join_all(reports).await {
        result.expect("Task panicked");
    }

    assert_eq!(wg.wait().await, Ok(()));
    assert_eq!(tracker.pending_count(), 0);
}
