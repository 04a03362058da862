use std::sync::Arc;
use std::thread;

use csvharvest_core::{Metrics, MetricsSnapshot};

#[test]
fn nocsv_and_duplicate_also_count_as_errors() {
    let metrics = Metrics::new();
    metrics.record_nocsv();
    metrics.record_duplicate();
    metrics.record_success();

    let snap = metrics.snapshot();
    assert_eq!(snap.nocsv, 1);
    assert_eq!(snap.duplicate, 1);
    assert_eq!(snap.error, 2);
    assert_eq!(snap.success, 1);
}

#[test]
fn job_ids_are_sequential_from_zero() {
    let metrics = Metrics::new();
    assert_eq!(metrics.next_job_id(), 0);
    assert_eq!(metrics.next_job_id(), 1);
    assert_eq!(metrics.snapshot().jobs, 2);
}

#[test]
fn concurrent_increments_are_not_lost() {
    let metrics = Arc::new(Metrics::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let metrics = metrics.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    metrics.record_resource();
                    metrics.record_success();
                    metrics.next_job_id();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snap = metrics.snapshot();
    assert_eq!(
        snap,
        MetricsSnapshot {
            jobs: 8_000,
            resources: 8_000,
            success: 8_000,
            ..MetricsSnapshot::default()
        }
    );
}
