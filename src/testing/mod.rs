//! Testing utilities for plugin services.
//!
//! This module provides doubles for code that sits on either side of
//! [`PluginServices`](crate::PluginServices):
//!
//! - [`MockEngine`]: A [`TraceEngine`](crate::engine::TraceEngine) that records every call
//! - [`MockFactory`]: An [`EngineFactory`](crate::engine::EngineFactory) that counts invocations
//! - [`ManualTicker`]: A clock that only moves when advanced
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tracehook::{PluginId, PluginServices};
//! use tracehook::testing::{ManualTicker, MockEngine, MockFactory};
//!
//! let engine = MockEngine::new().with_string_property("x", "y");
//! let services = PluginServices::new(PluginId::new("jdbc").unwrap(), Arc::new(ManualTicker::new()));
//!
//! assert!(services.string_property("x").is_err());
//! services.bind(&MockFactory::new(engine)).unwrap();
//! assert_eq!(services.string_property("x").unwrap(), Some("y".to_string()));
//! ```
//!
//! ## MockEngine vs TraceCollector
//!
//! | Feature | MockEngine | TraceCollector |
//! |---------|------------|----------------|
//! | Call recording | ✓ | ✗ |
//! | Canned property answers | ✓ | from config |
//! | Trace assembly | ✗ | ✓ |
//! | Metric aggregation | per name | per name |
//! | Best for | Unit tests | Integration tests |

mod manual_ticker;
mod mock_engine;
mod mock_factory;

pub use manual_ticker::ManualTicker;
pub use mock_engine::{EngineCall, MockEngine};
pub use mock_factory::MockFactory;
