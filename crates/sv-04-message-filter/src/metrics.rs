//! # Filter Metrics
//!
//! Lock-free counters, read through [`FilterMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct FilterMetrics {
    pub(crate) received: AtomicU64,
    pub(crate) forwarded: AtomicU64,
    pub(crate) blocked: AtomicU64,
    pub(crate) malformed: AtomicU64,
    pub(crate) key_mismatch: AtomicU64,
    pub(crate) redacted_tokens: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterMetricsSnapshot {
    pub received: u64,
    pub forwarded: u64,
    pub blocked: u64,
    pub malformed: u64,
    pub key_mismatch: u64,
    pub redacted_tokens: u64,
}

impl FilterMetrics {
    #[must_use]
    pub fn snapshot(&self) -> FilterMetricsSnapshot {
        FilterMetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            key_mismatch: self.key_mismatch.load(Ordering::Relaxed),
            redacted_tokens: self.redacted_tokens.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}
