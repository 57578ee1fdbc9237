//! # tracehook
//!
//! Late-binding plugin services for instrumentation hooks.
//!
//! Instrumentation hooks are often woven into application code, and
//! instantiated, before the tracing engine has finished starting. `tracehook`
//! gives each hook a [`PluginServices`] handle that is safe to call from the
//! first instruction and that transparently starts forwarding to the real
//! engine once the host binds it.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tracehook::prelude::*;
//!
//! // Early: hooks register before the engine exists.
//! let registry = ServicesRegistry::new(Arc::new(SystemTicker::new()));
//! let services = registry.get("jdbc")?;
//! let metric = services.create_metric("jdbc execute");
//!
//! let rows = services.execute_span(&metric, &MessageDetail::new("select 1"), || {
//!     Ok::<_, std::io::Error>(1)
//! })?;
//! assert_eq!(rows, 1);
//! assert!(!services.is_enabled());
//!
//! // Later: the host finishes starting and binds every plugin.
//! let collector = TraceCollector::new(EngineConfig::default())?;
//! registry.start(Arc::new(collector.factory()))?;
//! assert!(services.is_enabled());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Concepts
//!
//! - **Unbound → Bound, once**: [`PluginServices::bind`] publishes the engine
//!   exactly once; there is no way back.
//! - **Pass-through before binding**: span and metric wrappers run the
//!   intercepted call directly and return its result unchanged.
//! - **Fail loudly on contract violations**: property and attribute
//!   accessors return [`ErrorKind::NotReady`] until bound. Check
//!   [`PluginServices::is_enabled`] first.
//! - **Intercepted errors are never touched**: the wrapped call's own
//!   `Result<T, E>` comes back as-is, bound or not.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod clock;
pub mod continuation;
pub mod engine;
pub mod error;
pub mod metric;
pub mod services;
pub mod span;

// Host-side plumbing
pub mod collector;
pub mod config;
pub mod registry;

// Testing utilities
pub mod testing;

// Prelude for convenient imports
pub mod prelude;

// Re-export main types at crate root for convenience
pub use continuation::{Continuation, Outcome};
pub use engine::{EngineFactory, PluginId, TraceEngine};
pub use error::{Error, ErrorKind, Result};
pub use metric::{Metric, MetricSnapshot};
pub use registry::ServicesRegistry;
pub use services::PluginServices;
pub use span::{MessageDetail, RootSpanDetail, SpanDetail};
