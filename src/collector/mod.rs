//! In-memory reference tracing engine.
//!
//! [`TraceCollector`] is a process-wide engine core. Its
//! [`factory()`](TraceCollector::factory) hands the host an
//! [`EngineFactory`] that builds one [`PluginEngine`] view per plugin, all
//! sharing the collector's metric aggregates and trace buffer.
//!
//! Traces are per thread: a root span opens a trace on the calling thread,
//! spans started on that thread while it is open (by any plugin) nest inside
//! it, and the trace is completed when the root span's call returns.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tracehook::{PluginId, PluginServices};
//! use tracehook::clock::SystemTicker;
//! use tracehook::collector::TraceCollector;
//! use tracehook::config::EngineConfig;
//! use tracehook::span::MessageDetail;
//!
//! let collector = TraceCollector::new(EngineConfig::default())?;
//! let services = PluginServices::new(PluginId::new("servlet")?, Arc::new(SystemTicker::new()));
//! services.bind(&collector.factory())?;
//!
//! let metric = services.create_metric("http request");
//! services.execute_root_span(&metric, Arc::new(MessageDetail::new("GET /")), || {
//!     services.put_trace_attribute("status", "200")
//! })?;
//!
//! let traces = collector.completed_traces();
//! assert_eq!(traces[0].attribute("status"), Some("200"));
//! # Ok::<(), tracehook::Error>(())
//! ```

mod trace;

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    thread::{self, ThreadId},
};

use parking_lot::{Mutex, RwLock};

pub use trace::{CompletedTrace, SpanRecord};
use trace::ActiveTrace;

use crate::{
    clock::{SystemTicker, Ticker},
    config::{EngineConfig, PropertyValue},
    continuation::{Continuation, Outcome},
    engine::{EngineFactory, PluginId, TraceEngine},
    error::Result,
    metric::{EngineMetric, Metric, MetricSnapshot, MetricStats},
    span::{RootSpanDetail, SpanDetail},
};

/// Shared core of the reference engine.
#[derive(Clone)]
pub struct TraceCollector {
    inner: Arc<CollectorInner>,
}

struct CollectorInner {
    config: EngineConfig,
    ticker: Arc<dyn Ticker>,
    metrics: RwLock<HashMap<String, Arc<MetricStats>>>,
    active: Mutex<HashMap<ThreadId, ActiveTrace>>,
    completed: Mutex<VecDeque<CompletedTrace>>,
}

impl TraceCollector {
    /// Creates a collector timed by the system clock.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) if the
    /// configuration does not validate.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_ticker(config, Arc::new(SystemTicker::new()))
    }

    /// Creates a collector timed by `ticker`.
    pub fn with_ticker(config: EngineConfig, ticker: Arc<dyn Ticker>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(CollectorInner {
                config,
                ticker,
                metrics: RwLock::new(HashMap::new()),
                active: Mutex::new(HashMap::new()),
                completed: Mutex::new(VecDeque::new()),
            }),
        })
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns a factory building per-plugin engines on this collector.
    pub fn factory(&self) -> CollectorFactory {
        CollectorFactory { collector: self.clone() }
    }

    /// Returns the engine view for one plugin.
    pub fn engine(&self, plugin_id: PluginId) -> PluginEngine {
        PluginEngine { plugin_id, collector: self.clone() }
    }

    /// Returns completed traces, oldest first.
    pub fn completed_traces(&self) -> Vec<CompletedTrace> {
        self.inner.completed.lock().iter().cloned().collect()
    }

    /// Removes and returns completed traces, oldest first.
    pub fn drain_completed_traces(&self) -> Vec<CompletedTrace> {
        self.inner.completed.lock().drain(..).collect()
    }

    /// Returns the number of traces still open.
    pub fn active_trace_count(&self) -> usize {
        self.inner.active.lock().len()
    }

    /// Returns the aggregate for a metric name, if it was ever used.
    pub fn metric_snapshot(&self, name: &str) -> Option<MetricSnapshot> {
        self.inner.metrics.read().get(name).map(|stats| stats.snapshot())
    }

    /// Returns every metric name seen so far, sorted.
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.metrics.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the aggregate for `name`, creating it if it doesn't exist.
    fn stats_for(&self, name: &str) -> Arc<MetricStats> {
        let metrics = self.inner.metrics.read();
        if let Some(stats) = metrics.get(name) {
            return stats.clone();
        }
        drop(metrics);

        let mut metrics = self.inner.metrics.write();
        metrics.entry(name.to_string()).or_default().clone()
    }

    fn push_completed(&self, trace: CompletedTrace) {
        tracing::debug!(
            trace_id = %trace.id,
            plugin_id = %trace.plugin_id,
            duration_us = u64::try_from(trace.duration.as_micros()).unwrap_or(u64::MAX),
            spans = trace.spans.len(),
            "trace completed"
        );
        let mut completed = self.inner.completed.lock();
        while completed.len() >= self.inner.config.max_completed_traces {
            completed.pop_front();
        }
        completed.push_back(trace);
    }
}

impl std::fmt::Debug for TraceCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceCollector")
            .field("config", &self.inner.config)
            .field("active_traces", &self.active_trace_count())
            .finish_non_exhaustive()
    }
}

/// [`EngineFactory`] handing out [`PluginEngine`]s on one collector.
#[derive(Debug, Clone)]
pub struct CollectorFactory {
    collector: TraceCollector,
}

impl EngineFactory for CollectorFactory {
    fn create(&self, plugin_id: &PluginId) -> Result<Arc<dyn TraceEngine>> {
        Ok(Arc::new(self.collector.engine(plugin_id.clone())))
    }
}

/// The reference engine as seen by one plugin.
#[derive(Debug, Clone)]
pub struct PluginEngine {
    plugin_id: PluginId,
    collector: TraceCollector,
}

impl PluginEngine {
    /// Returns the plugin this view serves.
    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.collector.inner.config.plugin(self.plugin_id.as_str())?.property(name)
    }

    fn ticker(&self) -> &dyn Ticker {
        self.collector.inner.ticker.as_ref()
    }

    /// Records into the handle itself: engine handles share this collector's
    /// aggregate, standalone handles keep their samples to themselves.
    fn record_timing(&self, metric: &Metric, start: u64) {
        metric.record(self.ticker().elapsed_since(start));
    }

    /// Opens a span slot in this thread's trace, if one is open.
    fn enter_span(&self, thread: ThreadId, metric: &Metric, detail: &dyn SpanDetail, start: u64) -> Option<usize> {
        let mut active = self.collector.inner.active.lock();
        let trace = active.get_mut(&thread)?;
        trace.depth += 1;
        trace.spans.push(SpanRecord {
            description: detail.description(),
            metric: metric.name().to_string(),
            context: detail.context(),
            depth: trace.depth,
            offset: std::time::Duration::from_nanos(start.saturating_sub(trace.start_tick)),
            duration: std::time::Duration::ZERO,
            outcome: Outcome::Completed,
        });
        Some(trace.spans.len() - 1)
    }
}

impl TraceEngine for PluginEngine {
    fn create_metric(&self, name: &str) -> Metric {
        let stats = self.collector.stats_for(name);
        Metric::Engine(EngineMetric::new(name, stats, self.collector.inner.ticker.clone()))
    }

    fn is_enabled(&self) -> bool {
        self.collector.inner.config.enabled
    }

    fn string_property(&self, name: &str) -> Result<Option<String>> {
        Ok(self.property(name).and_then(PropertyValue::as_str).map(str::to_string))
    }

    fn boolean_property(&self, name: &str) -> Result<bool> {
        Ok(self.property(name).and_then(PropertyValue::as_bool).unwrap_or(false))
    }

    fn double_property(&self, name: &str) -> Result<Option<f64>> {
        Ok(self.property(name).and_then(PropertyValue::as_f64))
    }

    fn execute_root_span(
        &self,
        metric: &Metric,
        detail: Arc<dyn RootSpanDetail>,
        continuation: Continuation<'_>,
    ) {
        let thread = thread::current().id();
        let start = self.ticker().read();

        let opened = {
            let mut active = self.collector.inner.active.lock();
            if active.contains_key(&thread) {
                false
            } else {
                let trace = ActiveTrace::new(self.plugin_id.clone(), metric.name(), detail.clone(), start);
                active.insert(thread, trace);
                true
            }
        };
        if !opened {
            // a root span inside an open trace is recorded as a plain span
            return self.execute_span(metric, detail.as_ref(), continuation);
        }

        let mut scope = RootScope { engine: self, thread, start, outcome: None };
        let outcome = continuation.proceed();
        self.record_timing(metric, start);
        scope.outcome = Some(outcome);
    }

    fn execute_span(&self, metric: &Metric, detail: &dyn SpanDetail, continuation: Continuation<'_>) {
        let thread = thread::current().id();
        let start = self.ticker().read();

        let slot = self.enter_span(thread, metric, detail, start);
        let mut scope = SpanScope { engine: self, thread, slot, start, outcome: None };
        let outcome = continuation.proceed();
        self.record_timing(metric, start);
        scope.outcome = Some(outcome);
    }

    fn record_metric_data(&self, metric: &Metric, continuation: Continuation<'_>) {
        let start = self.ticker().read();
        continuation.proceed();
        self.record_timing(metric, start);
    }

    fn put_trace_attribute(&self, name: &str, value: &str) -> Result<()> {
        let thread = thread::current().id();
        let max = self.collector.inner.config.max_trace_attributes;
        let mut active = self.collector.inner.active.lock();
        match active.get_mut(&thread) {
            Some(trace) if trace.attributes.len() < max => {
                trace.attributes.push((name.to_string(), value.to_string()));
            },
            Some(trace) => {
                tracing::debug!(trace_id = %trace.id, attribute = name, "trace attribute limit reached, dropping");
            },
            None => {
                tracing::debug!(plugin_id = %self.plugin_id, attribute = name, "no active trace, dropping attribute");
            },
        }
        Ok(())
    }

    fn root_span_detail(&self) -> Result<Option<Arc<dyn RootSpanDetail>>> {
        let thread = thread::current().id();
        Ok(self.collector.inner.active.lock().get(&thread).map(|trace| trace.detail.clone()))
    }
}

/// Completes this thread's trace when the root call returns or unwinds.
struct RootScope<'a> {
    engine: &'a PluginEngine,
    thread: ThreadId,
    start: u64,
    outcome: Option<Outcome>,
}

impl Drop for RootScope<'_> {
    fn drop(&mut self) {
        let duration = self.engine.ticker().elapsed_since(self.start);
        let outcome = self.outcome.take().unwrap_or_else(|| Outcome::Failed("panicked".into()));
        let trace = self.engine.collector.inner.active.lock().remove(&self.thread);
        if let Some(trace) = trace {
            self.engine.collector.push_completed(trace.complete(duration, outcome));
        }
    }
}

/// Closes a span slot when the nested call returns or unwinds.
struct SpanScope<'a> {
    engine: &'a PluginEngine,
    thread: ThreadId,
    slot: Option<usize>,
    start: u64,
    outcome: Option<Outcome>,
}

impl Drop for SpanScope<'_> {
    fn drop(&mut self) {
        let Some(slot) = self.slot else {
            return;
        };
        let duration = self.engine.ticker().elapsed_since(self.start);
        let outcome = self.outcome.take().unwrap_or_else(|| Outcome::Failed("panicked".into()));
        let mut active = self.engine.collector.inner.active.lock();
        if let Some(trace) = active.get_mut(&self.thread) {
            trace.depth = trace.depth.saturating_sub(1);
            if let Some(span) = trace.spans.get_mut(slot) {
                span.duration = duration;
                span.outcome = outcome;
            }
        }
    }
}
