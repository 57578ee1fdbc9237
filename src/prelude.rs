//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy importing:
//!
//! ```rust
//! use tracehook::prelude::*;
//! ```
//!
//! This provides access to:
//! - Plugin services and their registry
//! - Error types
//! - Metric and span detail types
//! - The reference engine and its configuration

pub use crate::{
    clock::{SystemTicker, Ticker},
    collector::{CompletedTrace, TraceCollector},
    config::{EngineConfig, PluginConfig, PropertyValue},
    continuation::{Continuation, Outcome},
    engine::{EngineFactory, PluginId, TraceEngine},
    error::{Error, ErrorKind, Result},
    metric::{Metric, MetricSnapshot},
    registry::ServicesRegistry,
    services::PluginServices,
    span::{MessageDetail, RootSpanDetail, SpanDetail},
};
