//! Configuration types for the reference tracing engine.
//!
//! This module provides configuration options for:
//! - [`EngineConfig`]: Engine-wide switches and capacities
//! - [`PluginConfig`]: Properties served to one plugin
//! - [`PropertyValue`]: A single string, boolean or numeric property

mod engine;
mod property;

pub use engine::EngineConfig;
pub use property::{PluginConfig, PropertyValue};
