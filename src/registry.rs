//! Per-plugin registry of late-binding services.
//!
//! Instrumentation hooks ask the registry for their [`PluginServices`] once,
//! whenever they are instantiated, and keep the handle for the life of the
//! process. The host calls [`start`](ServicesRegistry::start) once when the
//! tracing engine is ready; every handle already given out is bound in
//! place, and handles requested afterwards come back bound.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use parking_lot::RwLock;

use crate::{
    clock::{SystemTicker, Ticker},
    engine::{EngineFactory, PluginId},
    error::{Error, ErrorKind, Result},
    services::PluginServices,
};

/// Hands out one [`PluginServices`] per plugin id.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use tracehook::registry::ServicesRegistry;
/// use tracehook::clock::SystemTicker;
/// use tracehook::testing::{MockEngine, MockFactory};
///
/// let registry = ServicesRegistry::new(Arc::new(SystemTicker::new()));
/// let early = registry.get("jdbc")?;
/// assert!(!early.is_bound());
///
/// registry.start(Arc::new(MockFactory::new(MockEngine::new())))?;
/// assert!(early.is_bound());
/// assert!(registry.get("servlet")?.is_bound());
/// # Ok::<(), tracehook::Error>(())
/// ```
pub struct ServicesRegistry {
    ticker: Arc<dyn Ticker>,
    state: RwLock<RegistryState>,
}

struct RegistryState {
    services: HashMap<PluginId, Arc<PluginServices>>,
    factory: Option<Arc<dyn EngineFactory>>,
}

impl ServicesRegistry {
    /// Creates an empty, not yet started registry.
    pub fn new(ticker: Arc<dyn Ticker>) -> Self {
        Self {
            ticker,
            state: RwLock::new(RegistryState { services: HashMap::new(), factory: None }),
        }
    }

    /// Returns the services for `plugin_id`, creating them if needed.
    ///
    /// Repeated calls with the same id return the same instance. After
    /// [`start`](ServicesRegistry::start), new instances are bound before
    /// they are returned. Binding runs outside the registry lock, so an
    /// engine factory may itself call `get`.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) for a blank id.
    /// - [`ErrorKind::EngineConstruction`](crate::ErrorKind::EngineConstruction)
    ///   if binding after start fails. The instance stays registered and the
    ///   next `get` retries the bind.
    pub fn get(&self, plugin_id: impl AsRef<str>) -> Result<Arc<PluginServices>> {
        let plugin_id = PluginId::new(plugin_id)?;

        let state = self.state.read();
        let existing = state.services.get(&plugin_id).cloned();
        let factory = state.factory.clone();
        drop(state);

        let (services, factory) = match existing {
            Some(services) => (services, factory),
            None => {
                let mut state = self.state.write();
                let services = state
                    .services
                    .entry(plugin_id.clone())
                    .or_insert_with(|| Arc::new(PluginServices::new(plugin_id.clone(), self.ticker.clone())))
                    .clone();
                let factory = state.factory.clone();
                drop(state);
                tracing::debug!(plugin_id = %plugin_id, "plugin services created");
                (services, factory)
            },
        };

        if let Some(factory) = factory {
            bind_pending(&services, factory.as_ref())?;
        }
        Ok(services)
    }

    /// Binds every services instance handed out so far to engines built by
    /// `factory`, and binds later ones as they are created.
    ///
    /// The factory is recorded before any bind runs, and no lock is held
    /// while it runs.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::AlreadyBound`](crate::ErrorKind::AlreadyBound) if the
    ///   registry was already started.
    /// - The first bind failure. Instances bound before the failure stay
    ///   bound; the registry is reset to not started, so the host may retry.
    pub fn start(&self, factory: Arc<dyn EngineFactory>) -> Result<()> {
        let pending = {
            let mut state = self.state.write();
            if state.factory.is_some() {
                tracing::warn!("services registry started more than once");
                return Err(Error::already_bound());
            }
            state.factory = Some(factory.clone());

            let mut pending: Vec<Arc<PluginServices>> = state.services.values().cloned().collect();
            pending.sort_by(|a, b| a.plugin_id().cmp(b.plugin_id()));
            pending
        };

        for services in &pending {
            if let Err(err) = bind_pending(services, factory.as_ref()) {
                let mut state = self.state.write();
                if state.factory.as_ref().is_some_and(|current| Arc::ptr_eq(current, &factory)) {
                    state.factory = None;
                }
                return Err(err);
            }
        }

        tracing::info!(plugins = pending.len(), "services registry started");
        Ok(())
    }

    /// Returns `true` once [`start`](ServicesRegistry::start) has been called
    /// and has not failed.
    pub fn is_started(&self) -> bool {
        self.state.read().factory.is_some()
    }

    /// Returns the number of plugins registered.
    pub fn len(&self) -> usize {
        self.state.read().services.len()
    }

    /// Returns `true` if no plugin has asked for services yet.
    pub fn is_empty(&self) -> bool {
        self.state.read().services.is_empty()
    }

    /// Returns the registered plugin ids, sorted.
    pub fn plugin_ids(&self) -> Vec<PluginId> {
        let mut ids: Vec<PluginId> = self.state.read().services.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Binds `services` unless it is bound or another thread is binding it.
fn bind_pending(services: &PluginServices, factory: &dyn EngineFactory) -> Result<()> {
    if services.is_bound() {
        return Ok(());
    }
    match services.bind(factory) {
        Err(err) if err.kind() == ErrorKind::AlreadyBound => Ok(()),
        result => result,
    }
}

impl std::fmt::Debug for ServicesRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicesRegistry")
            .field("plugins", &self.len())
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

static GLOBAL: OnceLock<ServicesRegistry> = OnceLock::new();

/// Returns the process-wide registry, timed by the system clock.
pub fn global() -> &'static ServicesRegistry {
    GLOBAL.get_or_init(|| ServicesRegistry::new(Arc::new(SystemTicker::new())))
}
