//! Configuration for the reference tracing engine.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};

use super::PluginConfig;
use crate::error::{Error, Result};

fn default_enabled() -> bool {
    true
}

fn default_max_completed_traces() -> usize {
    1000
}

fn default_max_trace_attributes() -> usize {
    64
}

/// Configuration for [`TraceCollector`](crate::collector::TraceCollector).
///
/// ## Default Values
///
/// - `enabled`: true
/// - `max_completed_traces`: 1000
/// - `max_trace_attributes`: 64
///
/// ## Example
///
/// ```rust
/// use tracehook::config::{EngineConfig, PluginConfig};
///
/// let config = EngineConfig::builder()
///     .max_completed_traces(100)
///     .build()
///     .with_plugin("jdbc", PluginConfig::new().with_property("capture_bind_params", true));
///
/// assert!(config.enabled);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct EngineConfig {
    /// Whether plugins should record anything at all.
    #[builder(default = default_enabled())]
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Number of completed traces kept in memory; oldest are evicted first.
    #[builder(default = default_max_completed_traces())]
    #[serde(default = "default_max_completed_traces")]
    pub max_completed_traces: usize,

    /// Number of attributes kept per trace; further attributes are dropped.
    #[builder(default = default_max_trace_attributes())]
    #[serde(default = "default_max_trace_attributes")]
    pub max_trace_attributes: usize,

    /// Per-plugin configuration by plugin id.
    #[builder(default)]
    #[serde(default)]
    pub plugins: HashMap<String, PluginConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Checks that capacities are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_completed_traces == 0 {
            return Err(Error::configuration("max_completed_traces must be greater than zero"));
        }
        if self.max_trace_attributes == 0 {
            return Err(Error::configuration("max_trace_attributes must be greater than zero"));
        }
        Ok(())
    }

    /// Adds the configuration for one plugin.
    #[must_use]
    pub fn with_plugin(mut self, plugin_id: impl Into<String>, plugin: PluginConfig) -> Self {
        self.plugins.insert(plugin_id.into(), plugin);
        self
    }

    /// Returns the configuration for one plugin, if any.
    pub fn plugin(&self, plugin_id: &str) -> Option<&PluginConfig> {
        self.plugins.get(plugin_id)
    }
}
