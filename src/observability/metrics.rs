//! Dispatch counters.
//!
//! Counters only, monotonic, reset on process start. Relaxed atomics; the
//! values are reporting aids, not synchronization.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::dispatch::Dispatched;

/// Counters over every dispatched action
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Actions dispatched
    dispatched: AtomicU64,
    /// Envelopes with a Failure outcome
    failures: AtomicU64,
    /// Actions run against both stores
    dual: AtomicU64,
    /// Dual runs whose two outcomes disagreed
    divergent: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub failures: u64,
    pub dual: u64,
    pub divergent: u64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one dispatch result
    pub fn record(&self, dispatched: &Dispatched) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        if !dispatched.envelope().is_success() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        if let Dispatched::Dual(dual) = dispatched {
            self.dual.fetch_add(1, Ordering::Relaxed);
            if dual.primary.outcome != dual.secondary.outcome {
                self.divergent.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            dual: self.dual.load(Ordering::Relaxed),
            divergent: self.divergent.load(Ordering::Relaxed),
        }
    }
}
