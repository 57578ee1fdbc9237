//! Metric handles.
//!
//! A [`Metric`] is a named timing accumulator. It comes in exactly two
//! variants, fixed at creation:
//!
//! - [`Metric::Standalone`]: handed out by unbound plugin services. Backed by
//!   a clock and a private accumulator, never connected to an engine.
//! - [`Metric::Engine`]: handed out by a bound engine. Shares the engine's
//!   aggregate for its name, so every handle for `"sql"` feeds the same totals.
//!
//! Both expose the same surface, so plugin code written before and after
//! binding is interchangeable.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tracehook::clock::SystemTicker;
//! use tracehook::metric::{Metric, StandaloneMetric};
//!
//! let metric = Metric::Standalone(StandaloneMetric::new("sql", Arc::new(SystemTicker::new())));
//! metric.record(Duration::from_millis(3));
//!
//! let timer = metric.start();
//! // ... timed work ...
//! timer.stop();
//!
//! assert_eq!(metric.snapshot().count, 2);
//! ```

mod stats;

use std::{sync::Arc, time::Duration};

pub use stats::{MetricSnapshot, MetricStats};

use crate::clock::Ticker;

/// A metric handle, either standalone or engine-owned.
#[derive(Debug, Clone)]
pub enum Metric {
    /// Created while no engine was bound.
    Standalone(StandaloneMetric),
    /// Created by a bound engine.
    Engine(EngineMetric),
}

impl Metric {
    /// Returns the metric name.
    pub fn name(&self) -> &str {
        match self {
            Metric::Standalone(metric) => &metric.inner.name,
            Metric::Engine(metric) => &metric.name,
        }
    }

    /// Records one timing sample.
    pub fn record(&self, duration: Duration) {
        self.stats().record(duration);
    }

    /// Starts timing; the elapsed time is recorded when the timer stops or drops.
    pub fn start(&self) -> MetricTimer<'_> {
        MetricTimer { metric: self, start: self.ticker().read(), stopped: false }
    }

    /// Returns the accumulated totals this handle contributes to.
    pub fn snapshot(&self) -> MetricSnapshot {
        self.stats().snapshot()
    }

    /// Returns `true` for handles created by a bound engine.
    pub fn is_engine_owned(&self) -> bool {
        matches!(self, Metric::Engine(_))
    }

    /// Returns `true` if both handles accumulate into the same totals.
    pub fn ptr_eq(a: &Metric, b: &Metric) -> bool {
        match (a, b) {
            (Metric::Standalone(a), Metric::Standalone(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            (Metric::Engine(a), Metric::Engine(b)) => Arc::ptr_eq(&a.stats, &b.stats),
            _ => false,
        }
    }

    fn stats(&self) -> &MetricStats {
        match self {
            Metric::Standalone(metric) => &metric.inner.stats,
            Metric::Engine(metric) => &metric.stats,
        }
    }

    fn ticker(&self) -> &dyn Ticker {
        match self {
            Metric::Standalone(metric) => metric.inner.ticker.as_ref(),
            Metric::Engine(metric) => metric.ticker.as_ref(),
        }
    }
}

/// A metric that lives only as long as the plugin holding it.
#[derive(Debug, Clone)]
pub struct StandaloneMetric {
    inner: Arc<StandaloneInner>,
}

#[derive(Debug)]
struct StandaloneInner {
    name: String,
    ticker: Arc<dyn Ticker>,
    stats: MetricStats,
}

impl StandaloneMetric {
    /// Creates a standalone metric timed by the given ticker.
    pub fn new(name: impl Into<String>, ticker: Arc<dyn Ticker>) -> Self {
        Self {
            inner: Arc::new(StandaloneInner { name: name.into(), ticker, stats: MetricStats::new() }),
        }
    }
}

/// A metric whose samples feed an engine's aggregate.
#[derive(Debug, Clone)]
pub struct EngineMetric {
    name: Arc<str>,
    stats: Arc<MetricStats>,
    ticker: Arc<dyn Ticker>,
}

impl EngineMetric {
    /// Creates a handle onto an engine-held aggregate.
    ///
    /// Engines hand out one `stats` per metric name and clone it into every
    /// handle for that name.
    pub fn new(name: impl Into<Arc<str>>, stats: Arc<MetricStats>, ticker: Arc<dyn Ticker>) -> Self {
        Self { name: name.into(), stats, ticker }
    }
}

/// Times a block of work against a [`Metric`].
///
/// Records on [`stop`](MetricTimer::stop), or on drop if never stopped.
#[derive(Debug)]
#[must_use = "dropping the timer immediately records a near-zero sample"]
pub struct MetricTimer<'a> {
    metric: &'a Metric,
    start: u64,
    stopped: bool,
}

impl MetricTimer<'_> {
    /// Stops the timer, records the sample and returns it.
    pub fn stop(mut self) -> Duration {
        self.finish()
    }

    fn finish(&mut self) -> Duration {
        let elapsed = self.metric.ticker().elapsed_since(self.start);
        self.metric.record(elapsed);
        self.stopped = true;
        elapsed
    }
}

impl Drop for MetricTimer<'_> {
    fn drop(&mut self) {
        if !self.stopped {
            self.finish();
        }
    }
}
