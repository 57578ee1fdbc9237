//! Lock-free timing accumulator shared by both metric variants.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// Accumulated timing samples for one metric name.
///
/// Counters use relaxed atomics: a snapshot taken while samples are being
/// recorded may mix old and new values, but never loses a sample.
#[derive(Debug)]
pub struct MetricStats {
    count: AtomicU64,
    total_ns: AtomicU64,
    min_ns: AtomicU64,
    max_ns: AtomicU64,
}

impl MetricStats {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            total_ns: AtomicU64::new(0),
            min_ns: AtomicU64::new(u64::MAX),
            max_ns: AtomicU64::new(0),
        }
    }

    /// Records one sample.
    pub fn record(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.min_ns.fetch_min(nanos, Ordering::Relaxed);
        self.max_ns.fetch_max(nanos, Ordering::Relaxed);
    }

    /// Returns a snapshot of the accumulated values.
    pub fn snapshot(&self) -> MetricSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let min_ns = self.min_ns.load(Ordering::Relaxed);
        MetricSnapshot {
            count,
            total_ns: self.total_ns.load(Ordering::Relaxed),
            min_ns: if count == 0 || min_ns == u64::MAX { 0 } else { min_ns },
            max_ns: self.max_ns.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of a metric's accumulated samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricSnapshot {
    /// Number of recorded samples.
    pub count: u64,
    /// Sum of all samples in nanoseconds.
    pub total_ns: u64,
    /// Smallest sample in nanoseconds (0 when empty).
    pub min_ns: u64,
    /// Largest sample in nanoseconds (0 when empty).
    pub max_ns: u64,
}

impl MetricSnapshot {
    /// Returns the total as a Duration.
    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_ns)
    }

    /// Returns the smallest sample as a Duration.
    pub fn min(&self) -> Duration {
        Duration::from_nanos(self.min_ns)
    }

    /// Returns the largest sample as a Duration.
    pub fn max(&self) -> Duration {
        Duration::from_nanos(self.max_ns)
    }

    /// Returns the mean sample, or zero when nothing was recorded.
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.total_ns / self.count)
    }
}
