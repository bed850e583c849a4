//! Load tests for ack tracking with 1000+ proxies.
//!
//! These tests verify the tracker holds up under high load:
//! - Pushes targeting 1000+ proxies
//! - Concurrent pushes and ack messages
//! - Many completions pending at once
//!
//! Run with: `cargo test --package integration-tests load_tests -- --nocapture`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Barrier;
use xds_push::prelude::*;

use crate::fixtures::*;

fn tracker() -> Arc<AckTracker> {
    Arc::new(AckTracker::new(Arc::new(VersionedStore::new())))
}

/// Test one push acknowledged by 1000 proxies.
#[tokio::test]
async fn test_push_to_1000_proxies() {
    let tracker = tracker();
    let proxies = proxies(1000);
    let wg = WaitGroup::new();
    let foo = names(&["bar/foo"]);

    let _ = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster("bar/foo", 1), &proxies, Some(&wg), None);

    let start = Instant::now();
    for proxy in &proxies {
        tracker.handle_resource_version_ack(1, 1, proxy.as_str(), &foo, TypeUrl::CLUSTER, "");
    }
    let duration = start.elapsed();
    println!(
        "Processed {} acks in {:?} ({:.2} µs/op)",
        proxies.len(),
        duration,
        duration.as_micros() as f64 / proxies.len() as f64
    );

    assert_eq!(wg.wait().await, Ok(()));
    assert_eq!(tracker.pending_count(), 0);
}

/// Test concurrent ack delivery for many pending pushes.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acks_1000_proxies() {
    let tracker = tracker();
    let proxies = proxies(1000);
    let num_pushes = 20;
    let num_tasks = 10;
    let per_task = proxies.len() / num_tasks;

    let wg = WaitGroup::new();
    let mut resource_names = Vec::new();
    for i in 0..num_pushes {
        let name = format!("cluster-{i}");
        let _ = tracker.upsert(TypeUrl::CLUSTER, &name, cluster(&name, 1), &proxies, Some(&wg), None);
        resource_names.push(name);
    }
    assert_eq!(tracker.pending_count(), num_pushes);
    let version = tracker.version();

    let barrier = Arc::new(Barrier::new(num_tasks));
    let total_acks = Arc::new(AtomicU64::new(0));
    let resource_names = Arc::new(resource_names);

    let start = Instant::now();
    let mut handles = Vec::new();
    for task_id in 0..num_tasks {
        let tracker = Arc::clone(&tracker);
        let barrier = Arc::clone(&barrier);
        let total_acks = Arc::clone(&total_acks);
        let resource_names = Arc::clone(&resource_names);
        let task_proxies = proxies[task_id * per_task..(task_id + 1) * per_task].to_vec();

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            for proxy in &task_proxies {
                tracker.handle_resource_version_ack(version, version, proxy.as_str(), &resource_names, TypeUrl::CLUSTER, "");
                total_acks.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    for handle in handles {
        handle.await.expect("Task panicked");
    }
    let duration = start.elapsed();
    let acks = total_acks.load(Ordering::Relaxed);
    println!(
        "Concurrent acks: {} in {:?} ({:.0} acks/sec)",
        acks,
        duration,
        acks as f64 / duration.as_secs_f64()
    );

    assert_eq!(acks, proxies.len() as u64);
    assert_eq!(wg.wait().await, Ok(()));
    assert_eq!(tracker.pending_count(), 0);
}

/// Stress test: pushes and ack messages racing each other.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pushes_racing_acks() {
    let tracker = tracker();
    let proxies = Arc::new(proxies(100));
    let num_writers = 4;
    let pushes_per_writer = 50;
    let barrier = Arc::new(Barrier::new(num_writers + 1));

    let mut writers = Vec::new();
    for writer_id in 0..num_writers {
        let tracker = Arc::clone(&tracker);
        let proxies = Arc::clone(&proxies);
        let barrier = Arc::clone(&barrier);
        writers.push(tokio::spawn(async move {
            barrier.wait().await;
            let mut groups = Vec::new();
            for i in 0..pushes_per_writer {
                let wg = WaitGroup::new();
                let name = format!("cluster-{writer_id}-{i}");
                let _ = tracker.upsert(TypeUrl::CLUSTER, &name, cluster(&name, 1), &proxies, Some(&wg), None);
                groups.push(wg);
                tokio::task::yield_now().await;
            }
            groups
        }));
    }

    // Every proxy keeps acking the latest version with all names until the
    // writers are done and every push is covered.
    let acker = {
        let tracker = Arc::clone(&tracker);
        let proxies = Arc::clone(&proxies);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            let total = (num_writers * pushes_per_writer) as u64;
            loop {
                let version = tracker.version();
                let names = tracker.mutator().resource_names(TypeUrl::CLUSTER);
                for proxy in proxies.iter() {
                    tracker.handle_resource_version_ack(version, version, proxy.as_str(), &names, TypeUrl::CLUSTER, "");
                }
                if version == total && tracker.pending_count() == 0 {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
    };

    let start = Instant::now();
    let mut groups = Vec::new();
    for writer in writers {
        groups.extend(writer.await.expect("Task panicked"));
    }
    acker.await.expect("Task panicked");
    println!("Racing pushes and acks finished in {:?}", start.elapsed());

    for wg in groups {
        assert_eq!(wg.wait().await, Ok(()));
    }
    assert_eq!(tracker.version(), (num_writers * pushes_per_writer) as u64);
}

/// Test ack messages against 5000 pending completions that none of them satisfy.
#[tokio::test]
async fn test_5000_pending_completions() {
    let tracker = tracker();
    let proxies = proxies(2);
    let wg = WaitGroup::new();

    let start = Instant::now();
    for i in 0..5000 {
        let name = format!("cluster-{i}");
        let _ = tracker.upsert(TypeUrl::CLUSTER, &name, cluster(&name, 1), &proxies, Some(&wg), None);
    }
    println!("Registered 5000 completions in {:?}", start.elapsed());
    assert_eq!(tracker.pending_count(), 5000);

    // Only the first proxy reports; every completion still waits for the second.
    let start = Instant::now();
    let all = tracker.mutator().resource_names(TypeUrl::CLUSTER);
    tracker.handle_resource_version_ack(5000, 5000, proxies[0].as_str(), &all, TypeUrl::CLUSTER, "");
    println!("Processed one ack against 5000 completions in {:?}", start.elapsed());
    assert_eq!(tracker.pending_count(), 5000);

    tracker.handle_resource_version_ack(5000, 5000, proxies[1].as_str(), &all, TypeUrl::CLUSTER, "");
    assert_eq!(tracker.pending_count(), 0);
    assert_eq!(wg.wait().await, Ok(()));
}
