//! MockEngine for testing plugin services forwarding.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{
    clock::{SystemTicker, Ticker},
    continuation::{Continuation, Outcome},
    engine::TraceEngine,
    error::{Error, Result},
    metric::{EngineMetric, Metric, MetricStats},
    span::{RootSpanDetail, SpanDetail},
};

/// A call observed by a [`MockEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    /// `create_metric(name)`
    CreateMetric(String),
    /// `is_enabled()`
    IsEnabled,
    /// `string_property(name)`
    StringProperty(String),
    /// `boolean_property(name)`
    BooleanProperty(String),
    /// `double_property(name)`
    DoubleProperty(String),
    /// `execute_root_span(metric, detail, ..)`
    ExecuteRootSpan {
        /// Metric name.
        metric: String,
        /// Detail description.
        description: String,
    },
    /// `execute_span(metric, detail, ..)`
    ExecuteSpan {
        /// Metric name.
        metric: String,
        /// Detail description.
        description: String,
    },
    /// `record_metric_data(metric, ..)`
    RecordMetricData(String),
    /// `put_trace_attribute(name, value)`
    PutTraceAttribute {
        /// Attribute name.
        name: String,
        /// Attribute value.
        value: String,
    },
    /// `root_span_detail()`
    RootSpanDetail,
}

/// A [`TraceEngine`] that records every call it receives.
///
/// Clones share state, so a test can keep one clone and hand the other to
/// plugin services.
///
/// ## Example
///
/// ```rust
/// use tracehook::testing::{EngineCall, MockEngine};
/// use tracehook::engine::TraceEngine;
///
/// let engine = MockEngine::new().with_string_property("x", "y");
/// assert_eq!(engine.string_property("x").unwrap(), Some("y".to_string()));
/// assert_eq!(engine.calls(), vec![EngineCall::StringProperty("x".into())]);
/// ```
#[derive(Clone)]
pub struct MockEngine {
    state: Arc<MockState>,
    ticker: Arc<dyn Ticker>,
    enabled: bool,
    skip_proceed: bool,
    string_properties: HashMap<String, String>,
    boolean_properties: HashMap<String, bool>,
    double_properties: HashMap<String, f64>,
    property_error: Option<&'static str>,
}

struct MockState {
    calls: Mutex<Vec<EngineCall>>,
    outcomes: Mutex<Vec<Outcome>>,
    metrics: Mutex<HashMap<String, Arc<MetricStats>>>,
    root_detail: Mutex<Option<Arc<dyn RootSpanDetail>>>,
}

impl MockEngine {
    /// Creates an enabled mock engine with no properties.
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                calls: Mutex::new(Vec::new()),
                outcomes: Mutex::new(Vec::new()),
                metrics: Mutex::new(HashMap::new()),
                root_detail: Mutex::new(None),
            }),
            ticker: Arc::new(SystemTicker::new()),
            enabled: true,
            skip_proceed: false,
            string_properties: HashMap::new(),
            boolean_properties: HashMap::new(),
            double_properties: HashMap::new(),
            property_error: None,
        }
    }

    /// Times continuations and metrics with `ticker` instead of the system clock.
    #[must_use]
    pub fn with_ticker(mut self, ticker: Arc<dyn Ticker>) -> Self {
        self.ticker = ticker;
        self
    }

    /// Sets the value `is_enabled()` answers.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Answers `string_property(name)` with `value`.
    #[must_use]
    pub fn with_string_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_properties.insert(name.into(), value.into());
        self
    }

    /// Answers `boolean_property(name)` with `value`.
    #[must_use]
    pub fn with_boolean_property(mut self, name: impl Into<String>, value: bool) -> Self {
        self.boolean_properties.insert(name.into(), value);
        self
    }

    /// Answers `double_property(name)` with `value`.
    #[must_use]
    pub fn with_double_property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.double_properties.insert(name.into(), value);
        self
    }

    /// Makes every property accessor fail with a configuration error.
    #[must_use]
    pub fn with_property_error(mut self, message: &'static str) -> Self {
        self.property_error = Some(message);
        self
    }

    /// Makes the engine return without proceeding its continuations.
    ///
    /// Exercises the plugin services fallback that still runs the call once.
    #[must_use]
    pub fn skip_proceed(mut self) -> Self {
        self.skip_proceed = true;
        self
    }

    /// Returns every call received so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.calls.lock().clone()
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.state.calls.lock().len()
    }

    /// Returns the outcome of every continuation the engine proceeded.
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.state.outcomes.lock().clone()
    }

    /// Clears recorded calls and outcomes.
    pub fn reset(&self) {
        self.state.calls.lock().clear();
        self.state.outcomes.lock().clear();
    }

    fn record_call(&self, call: EngineCall) {
        self.state.calls.lock().push(call);
    }

    fn property_result(&self) -> Result<()> {
        match self.property_error {
            Some(message) => Err(Error::configuration(message)),
            None => Ok(()),
        }
    }

    fn run(&self, metric: &Metric, continuation: Continuation<'_>) {
        if self.skip_proceed {
            return;
        }
        let start = self.ticker.read();
        let outcome = continuation.proceed();
        metric.record(self.ticker.elapsed_since(start));
        self.state.outcomes.lock().push(outcome);
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEngine")
            .field("enabled", &self.enabled)
            .field("skip_proceed", &self.skip_proceed)
            .field("call_count", &self.call_count())
            .finish_non_exhaustive()
    }
}

impl TraceEngine for MockEngine {
    fn create_metric(&self, name: &str) -> Metric {
        self.record_call(EngineCall::CreateMetric(name.to_string()));
        let stats = self.state.metrics.lock().entry(name.to_string()).or_default().clone();
        Metric::Engine(EngineMetric::new(name, stats, self.ticker.clone()))
    }

    fn is_enabled(&self) -> bool {
        self.record_call(EngineCall::IsEnabled);
        self.enabled
    }

    fn string_property(&self, name: &str) -> Result<Option<String>> {
        self.record_call(EngineCall::StringProperty(name.to_string()));
        self.property_result()?;
        Ok(self.string_properties.get(name).cloned())
    }

    fn boolean_property(&self, name: &str) -> Result<bool> {
        self.record_call(EngineCall::BooleanProperty(name.to_string()));
        self.property_result()?;
        Ok(self.boolean_properties.get(name).copied().unwrap_or(false))
    }

    fn double_property(&self, name: &str) -> Result<Option<f64>> {
        self.record_call(EngineCall::DoubleProperty(name.to_string()));
        self.property_result()?;
        Ok(self.double_properties.get(name).copied())
    }

    fn execute_root_span(
        &self,
        metric: &Metric,
        detail: Arc<dyn RootSpanDetail>,
        continuation: Continuation<'_>,
    ) {
        self.record_call(EngineCall::ExecuteRootSpan {
            metric: metric.name().to_string(),
            description: detail.description(),
        });
        *self.state.root_detail.lock() = Some(detail);
        self.run(metric, continuation);
        *self.state.root_detail.lock() = None;
    }

    fn execute_span(&self, metric: &Metric, detail: &dyn SpanDetail, continuation: Continuation<'_>) {
        self.record_call(EngineCall::ExecuteSpan {
            metric: metric.name().to_string(),
            description: detail.description(),
        });
        self.run(metric, continuation);
    }

    fn record_metric_data(&self, metric: &Metric, continuation: Continuation<'_>) {
        self.record_call(EngineCall::RecordMetricData(metric.name().to_string()));
        self.run(metric, continuation);
    }

    fn put_trace_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.record_call(EngineCall::PutTraceAttribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn root_span_detail(&self) -> Result<Option<Arc<dyn RootSpanDetail>>> {
        self.record_call(EngineCall::RootSpanDetail);
        Ok(self.state.root_detail.lock().clone())
    }
}
