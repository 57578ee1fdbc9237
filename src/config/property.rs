//! Plugin property values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A plugin property as configured for the tracing engine.
///
/// # Example
///
/// ```rust
/// use tracehook::config::PropertyValue;
///
/// let threshold: PropertyValue = 0.25.into();
/// let capture: PropertyValue = true.into();
/// let mode: PropertyValue = "full".into();
///
/// assert_eq!(threshold.as_f64(), Some(0.25));
/// assert_eq!(capture.as_bool(), Some(true));
/// assert_eq!(mode.as_str(), Some("full"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean value.
    Boolean(bool),

    /// Numeric value.
    Double(f64),

    /// String value.
    String(String),
}

impl PropertyValue {
    /// Returns the boolean value if this is a Boolean variant.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the numeric value if this is a Double variant.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the string value if this is a String variant.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Double(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

/// Per-plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Plugin properties by name.
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl PluginConfig {
    /// Creates an empty plugin configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Returns a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}
