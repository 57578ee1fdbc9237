//! MockFactory for testing bind semantics.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    engine::{EngineFactory, PluginId, TraceEngine},
    error::{Error, Result},
};

/// An [`EngineFactory`] that counts its invocations.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use tracehook::{PluginId, PluginServices};
/// use tracehook::clock::SystemTicker;
/// use tracehook::testing::{MockEngine, MockFactory};
///
/// let factory = MockFactory::new(MockEngine::new());
/// let services = PluginServices::new(PluginId::new("jdbc").unwrap(), Arc::new(SystemTicker::new()));
///
/// services.bind(&factory).unwrap();
/// assert!(services.bind(&factory).is_err());
/// assert_eq!(factory.create_count(), 1);
/// ```
#[derive(Clone)]
pub struct MockFactory {
    engine: Option<Arc<dyn TraceEngine>>,
    failure: &'static str,
    created: Arc<AtomicUsize>,
    plugin_ids: Arc<parking_lot::Mutex<Vec<PluginId>>>,
}

impl MockFactory {
    /// Creates a factory that hands out `engine` for every plugin.
    pub fn new(engine: impl TraceEngine + 'static) -> Self {
        Self::from_arc(Arc::new(engine))
    }

    /// Creates a factory that hands out a shared engine.
    pub fn from_arc(engine: Arc<dyn TraceEngine>) -> Self {
        Self {
            engine: Some(engine),
            failure: "",
            created: Arc::new(AtomicUsize::new(0)),
            plugin_ids: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    /// Creates a factory whose every call fails with `message`.
    pub fn failing(message: &'static str) -> Self {
        Self {
            engine: None,
            failure: message,
            created: Arc::new(AtomicUsize::new(0)),
            plugin_ids: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    /// Returns how many times `create` was called.
    pub fn create_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Returns the plugin ids `create` was called with, in order.
    pub fn plugin_ids(&self) -> Vec<PluginId> {
        self.plugin_ids.lock().clone()
    }
}

impl std::fmt::Debug for MockFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFactory")
            .field("failing", &self.engine.is_none())
            .field("create_count", &self.create_count())
            .finish_non_exhaustive()
    }
}

impl EngineFactory for MockFactory {
    fn create(&self, plugin_id: &PluginId) -> Result<Arc<dyn TraceEngine>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.plugin_ids.lock().push(plugin_id.clone());
        match &self.engine {
            Some(engine) => Ok(engine.clone()),
            None => Err(Error::internal(self.failure)),
        }
    }
}
