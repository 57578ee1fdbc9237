//! Common test harness for tracehook integration tests.

use std::{
    cell::Cell,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use tracehook::{
    Continuation, Metric, PluginId, PluginServices, RootSpanDetail, SpanDetail, TraceEngine,
    clock::SystemTicker,
    metric::{EngineMetric, MetricStats},
};

static TRACING: OnceLock<()> = OnceLock::new();

/// Installs a test subscriber once, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Creates unbound services for `plugin` on the system clock.
pub fn services(plugin: &str) -> anyhow::Result<PluginServices> {
    init_tracing();
    Ok(PluginServices::new(PluginId::new(plugin)?, Arc::new(SystemTicker::new())))
}

thread_local! {
    static INSIDE_PROBE: Cell<bool> = const { Cell::new(false) };
}

/// Returns `true` when called from a continuation a [`ProbeEngine`] is running.
pub fn inside_probe() -> bool {
    INSIDE_PROBE.with(Cell::get)
}

/// A minimal engine that marks the continuations it runs.
///
/// Continuations can call [`inside_probe`] to learn whether they were
/// forwarded or passed straight through.
#[derive(Debug, Default)]
pub struct ProbeEngine {
    forwarded: AtomicUsize,
    stats: Arc<MetricStats>,
}

impl ProbeEngine {
    pub fn forwarded(&self) -> usize {
        self.forwarded.load(Ordering::SeqCst)
    }

    fn run(&self, continuation: Continuation<'_>) {
        self.forwarded.fetch_add(1, Ordering::SeqCst);
        INSIDE_PROBE.with(|inside| inside.set(true));
        continuation.proceed();
        INSIDE_PROBE.with(|inside| inside.set(false));
    }
}

impl TraceEngine for ProbeEngine {
    fn create_metric(&self, name: &str) -> Metric {
        Metric::Engine(EngineMetric::new(name, self.stats.clone(), Arc::new(SystemTicker::new())))
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn string_property(&self, _name: &str) -> tracehook::Result<Option<String>> {
        Ok(None)
    }

    fn boolean_property(&self, _name: &str) -> tracehook::Result<bool> {
        Ok(false)
    }

    fn double_property(&self, _name: &str) -> tracehook::Result<Option<f64>> {
        Ok(None)
    }

    fn execute_root_span(
        &self,
        _metric: &Metric,
        _detail: Arc<dyn RootSpanDetail>,
        continuation: Continuation<'_>,
    ) {
        self.run(continuation);
    }

    fn execute_span(&self, _metric: &Metric, _detail: &dyn SpanDetail, continuation: Continuation<'_>) {
        self.run(continuation);
    }

    fn record_metric_data(&self, _metric: &Metric, continuation: Continuation<'_>) {
        self.run(continuation);
    }

    fn put_trace_attribute(&self, _name: &str, _value: &str) -> tracehook::Result<()> {
        Ok(())
    }

    fn root_span_detail(&self) -> tracehook::Result<Option<Arc<dyn RootSpanDetail>>> {
        Ok(None)
    }
}
