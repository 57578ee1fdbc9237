//! Late-binding plugin services.
//!
//! Instrumentation hooks may be instantiated, and ask for their
//! [`PluginServices`], before the tracing engine has finished starting. They
//! get a services instance that works immediately and that starts forwarding
//! to the real engine as soon as the host calls [`bind`](PluginServices::bind).
//!
//! ## States
//!
//! - **Unbound** (initial): metrics are standalone, `is_enabled()` is `false`,
//!   intercepted calls pass straight through, property and attribute
//!   accessors fail with [`ErrorKind::NotReady`](crate::ErrorKind::NotReady).
//! - **Bound** (terminal): every call is forwarded to the engine.
//!
//! The engine reference is published once through a [`OnceLock`]: readers on
//! the hot path do a single acquire load and never lock. A call racing with
//! `bind` may take either path; a call that starts after `bind` returns
//! always sees the engine.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tracehook::{PluginId, PluginServices, span::MessageDetail};
//! use tracehook::clock::SystemTicker;
//!
//! let services = PluginServices::new(PluginId::new("jdbc")?, Arc::new(SystemTicker::new()));
//! let metric = services.create_metric("jdbc execute");
//!
//! // Not bound yet: the call passes straight through.
//! let rows = services.execute_span(&metric, &MessageDetail::new("select 1"), || {
//!     Ok::<_, std::io::Error>(vec![1])
//! })?;
//! assert_eq!(rows, vec![1]);
//! assert!(!services.is_enabled());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    fmt,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    clock::Ticker,
    continuation::{self, Outcome},
    engine::{EngineFactory, PluginId, TraceEngine},
    error::{Error, Result},
    metric::{Metric, StandaloneMetric},
    span::{RootSpanDetail, SpanDetail},
};

/// The entry point instrumentation hooks hold for the life of the process.
pub struct PluginServices {
    plugin_id: PluginId,
    ticker: Arc<dyn Ticker>,
    binding: AtomicBool,
    engine: OnceLock<Arc<dyn TraceEngine>>,
}

impl PluginServices {
    /// Creates unbound services for `plugin_id`.
    ///
    /// `ticker` times the standalone metrics handed out before binding.
    pub fn new(plugin_id: PluginId, ticker: Arc<dyn Ticker>) -> Self {
        Self { plugin_id, ticker, binding: AtomicBool::new(false), engine: OnceLock::new() }
    }

    /// Returns the plugin these services belong to.
    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    /// Returns `true` once an engine has been published.
    pub fn is_bound(&self) -> bool {
        self.engine.get().is_some()
    }

    #[inline]
    fn engine(&self) -> Option<&Arc<dyn TraceEngine>> {
        self.engine.get()
    }

    fn require_engine(&self, operation: &'static str) -> Result<&Arc<dyn TraceEngine>> {
        self.engine().ok_or_else(|| {
            tracing::debug!(plugin_id = %self.plugin_id, operation, "rejected before engine is bound");
            Error::not_ready().with_plugin_id(self.plugin_id.as_str())
        })
    }

    /// Returns a metric handle for `name`.
    ///
    /// Unbound, the handle is standalone: usable, but its samples never reach
    /// an engine.
    pub fn create_metric(&self, name: &str) -> Metric {
        match self.engine() {
            Some(engine) => engine.create_metric(name),
            None => Metric::Standalone(StandaloneMetric::new(name, self.ticker.clone())),
        }
    }

    /// Returns `true` if the plugin should record anything.
    ///
    /// Always `false` while unbound. Plugins must check this before calling
    /// the property and attribute accessors.
    pub fn is_enabled(&self) -> bool {
        self.engine().is_some_and(|engine| engine.is_enabled())
    }

    /// Returns a string plugin property.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotReady`](crate::ErrorKind::NotReady) while unbound;
    /// otherwise whatever the engine returns.
    pub fn string_property(&self, name: &str) -> Result<Option<String>> {
        self.require_engine("string_property")?.string_property(name)
    }

    /// Returns a boolean plugin property.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotReady`](crate::ErrorKind::NotReady) while unbound.
    pub fn boolean_property(&self, name: &str) -> Result<bool> {
        self.require_engine("boolean_property")?.boolean_property(name)
    }

    /// Returns a numeric plugin property.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotReady`](crate::ErrorKind::NotReady) while unbound.
    pub fn double_property(&self, name: &str) -> Result<Option<f64>> {
        self.require_engine("double_property")?.double_property(name)
    }

    /// Runs `work` as the root span of a new trace.
    ///
    /// `work` runs exactly once and its result, `Ok` or `Err`, is returned
    /// unchanged. Unbound, nothing is recorded.
    pub fn execute_root_span<T, E, F>(
        &self,
        metric: &Metric,
        detail: Arc<dyn RootSpanDetail>,
        work: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        match self.engine() {
            Some(engine) => continuation::run_erased(work, Outcome::of_result, |continuation| {
                engine.execute_root_span(metric, detail, continuation)
            }),
            None => work(),
        }
    }

    /// Runs `work` as a span nested in the current trace.
    ///
    /// Same pass-through guarantees as
    /// [`execute_root_span`](PluginServices::execute_root_span).
    pub fn execute_span<T, E, F>(
        &self,
        metric: &Metric,
        detail: &dyn SpanDetail,
        work: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        match self.engine() {
            Some(engine) => continuation::run_erased(work, Outcome::of_result, |continuation| {
                engine.execute_span(metric, detail, continuation)
            }),
            None => work(),
        }
    }

    /// Runs a fallible `work`, accumulating its timing against `metric`.
    pub fn try_record_metric_data<T, E, F>(&self, metric: &Metric, work: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        match self.engine() {
            Some(engine) => continuation::run_erased(work, Outcome::of_result, |continuation| {
                engine.record_metric_data(metric, continuation)
            }),
            None => work(),
        }
    }

    /// Runs an infallible `work`, accumulating its timing against `metric`.
    pub fn record_metric_data<T, F>(&self, metric: &Metric, work: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self.engine() {
            Some(engine) => continuation::run_erased(work, continuation::completed, |continuation| {
                engine.record_metric_data(metric, continuation)
            }),
            None => work(),
        }
    }

    /// Attaches an attribute to the current trace.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotReady`](crate::ErrorKind::NotReady) while unbound.
    pub fn put_trace_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.require_engine("put_trace_attribute")?.put_trace_attribute(name, value)
    }

    /// Returns the root span detail of the current trace.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotReady`](crate::ErrorKind::NotReady) while unbound.
    pub fn root_span_detail(&self) -> Result<Option<Arc<dyn RootSpanDetail>>> {
        self.require_engine("root_span_detail")?.root_span_detail()
    }

    /// Builds the engine with `factory` and starts forwarding to it.
    ///
    /// The factory is called at most once per services instance. Must be
    /// called by the host startup sequence only.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::AlreadyBound`](crate::ErrorKind::AlreadyBound) if a bind
    ///   already succeeded or is in flight.
    /// - [`ErrorKind::EngineConstruction`](crate::ErrorKind::EngineConstruction)
    ///   if the factory fails; the factory error is kept as the source and
    ///   the services stay unbound.
    pub fn bind(&self, factory: &dyn EngineFactory) -> Result<()> {
        if self.binding.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            tracing::warn!(plugin_id = %self.plugin_id, "plugin services bound more than once");
            return Err(Error::already_bound().with_plugin_id(self.plugin_id.as_str()));
        }

        let guard = BindingGuard { binding: &self.binding, armed: true };
        let engine = match factory.create(&self.plugin_id) {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!(plugin_id = %self.plugin_id, error = %err, "engine construction failed");
                return Err(Error::engine_construction(format!(
                    "engine factory failed for plugin {}",
                    self.plugin_id
                ))
                .with_plugin_id(self.plugin_id.as_str())
                .with_source(err));
            },
        };

        if self.engine.set(engine).is_err() {
            return Err(Error::internal("engine slot written outside bind")
                .with_plugin_id(self.plugin_id.as_str()));
        }
        guard.disarm();

        tracing::info!(plugin_id = %self.plugin_id, "plugin services bound to tracing engine");
        Ok(())
    }
}

/// Clears the `binding` flag on drop, including when the factory unwinds,
/// unless disarmed after the engine is published.
struct BindingGuard<'a> {
    binding: &'a AtomicBool,
    armed: bool,
}

impl BindingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for BindingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.binding.store(false, Ordering::Release);
        }
    }
}

impl fmt::Debug for PluginServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginServices")
            .field("plugin_id", &self.plugin_id)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}
