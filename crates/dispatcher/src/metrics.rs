//! Run metrics for observability

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Live counters of a single run, shared between the run task and its owner
#[derive(Debug, Default)]
pub struct RunMetrics {
    /// Attempts finished (terminal outcome reported)
    attempted: AtomicU32,
    /// Attempts that ended delivered
    sent: AtomicU32,
    /// Attempts that ended undelivered
    failed: AtomicU32,
    /// Attempts that needed the retry
    retries: AtomicU32,
    /// Run log appends that failed
    log_failures: AtomicU64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempted(&self) -> u32 {
        self.attempted.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> u32 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u32 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn log_failures(&self) -> u64 {
        self.log_failures.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_log_failures(&self) {
        self.log_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempted: self.attempted(),
            sent: self.sent(),
            failed: self.failed(),
            retries: self.retries(),
            log_failures: self.log_failures(),
        }
    }
}

/// Snapshot of run metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempted: u32,
    pub sent: u32,
    pub failed: u32,
    pub retries: u32,
    pub log_failures: u64,
}
