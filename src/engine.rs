//! The tracing engine contract plugin services forward to once bound.

use std::{fmt, sync::Arc};

use crate::{
    continuation::Continuation,
    error::{Error, Result},
    metric::Metric,
    span::{RootSpanDetail, SpanDetail},
};

/// Identity of the plugin (instrumentation caller) a services instance serves.
///
/// ## Example
///
/// ```rust
/// use tracehook::PluginId;
///
/// let id = PluginId::new("jdbc").unwrap();
/// assert_eq!(id.as_str(), "jdbc");
/// assert!(PluginId::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(Arc<str>);

impl PluginId {
    /// Creates a plugin id, rejecting blank identifiers.
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(Error::invalid_argument("plugin id cannot be empty"));
        }
        Ok(Self(Arc::from(id)))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PluginId {
    type Error = Error;

    fn try_from(id: &str) -> Result<Self> {
        Self::new(id)
    }
}

/// A fully initialized tracing engine, scoped to one plugin.
///
/// Span and metric operations receive the intercepted call as a
/// [`Continuation`]. Implementations must not swallow it: proceed exactly
/// once, recording whatever they need around the call. A panic raised by the
/// continuation must be allowed to unwind: an engine that catches it and
/// returns normally makes plugin services resume unwinding with
/// [`CAUGHT_CONTINUATION_PANIC`](crate::continuation::CAUGHT_CONTINUATION_PANIC).
pub trait TraceEngine: Send + Sync {
    /// Returns an engine-owned metric for `name`.
    fn create_metric(&self, name: &str) -> Metric;

    /// Returns `true` if the plugin should record anything at all.
    fn is_enabled(&self) -> bool;

    /// Returns a string plugin property.
    fn string_property(&self, name: &str) -> Result<Option<String>>;

    /// Returns a boolean plugin property; absent properties are `false`.
    fn boolean_property(&self, name: &str) -> Result<bool>;

    /// Returns a numeric plugin property.
    fn double_property(&self, name: &str) -> Result<Option<f64>>;

    /// Runs `continuation` as the root span of a new trace.
    fn execute_root_span(
        &self,
        metric: &Metric,
        detail: Arc<dyn RootSpanDetail>,
        continuation: Continuation<'_>,
    );

    /// Runs `continuation` as a span nested in the current trace.
    fn execute_span(&self, metric: &Metric, detail: &dyn SpanDetail, continuation: Continuation<'_>);

    /// Runs `continuation`, accumulating its timing against `metric`.
    fn record_metric_data(&self, metric: &Metric, continuation: Continuation<'_>);

    /// Attaches an attribute to the current trace.
    fn put_trace_attribute(&self, name: &str, value: &str) -> Result<()>;

    /// Returns the root span detail of the current trace, if one is active.
    fn root_span_detail(&self) -> Result<Option<Arc<dyn RootSpanDetail>>>;
}

/// Builds the engine for a plugin when the host finishes starting.
///
/// Plugin services call [`create`](EngineFactory::create) at most once. The
/// factory itself need not be idempotent.
pub trait EngineFactory: Send + Sync {
    /// Creates the engine for `plugin_id`.
    fn create(&self, plugin_id: &PluginId) -> Result<Arc<dyn TraceEngine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(&PluginId) -> Result<Arc<dyn TraceEngine>> + Send + Sync,
{
    fn create(&self, plugin_id: &PluginId) -> Result<Arc<dyn TraceEngine>> {
        self(plugin_id)
    }
}
