use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

pub type JobId = u64;

/// Run-wide counters shared by every worker of one orchestrator run.
///
/// All updates are `fetch_add`, so concurrent increments are never lost.
#[derive(Debug, Default)]
pub struct Metrics {
    counter: AtomicU64,
    fetched: AtomicU64,
    resources: AtomicU64,
    success: AtomicU64,
    error: AtomicU64,
    nocsv: AtomicU64,
    duplicate: AtomicU64,
}

/// Point-in-time copy of [`Metrics`], used for progress lines and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub jobs: u64,
    pub fetched: u64,
    pub resources: u64,
    pub success: u64,
    pub error: u64,
    pub nocsv: u64,
    pub duplicate: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next job id; ids start at 0 and are unique per run.
    pub fn next_job_id(&self) -> JobId {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    pub fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resource(&self) {
        self.resources.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error.fetch_add(1, Ordering::Relaxed);
    }

    /// A non-CSV resource counts as both `nocsv` and `error`.
    pub fn record_nocsv(&self) {
        self.nocsv.fetch_add(1, Ordering::Relaxed);
        self.record_error();
    }

    /// A repeated URL counts as both `duplicate` and `error`.
    pub fn record_duplicate(&self) {
        self.duplicate.fetch_add(1, Ordering::Relaxed);
        self.record_error();
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs: self.counter.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            resources: self.resources.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            error: self.error.load(Ordering::Relaxed),
            nocsv: self.nocsv.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
        }
    }
}
