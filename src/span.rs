//! Descriptive data attached to traced work.

use std::fmt;

/// Caller-supplied description of a nested span.
///
/// Plugin services never modify a detail; it is handed to the bound engine
/// as-is.
pub trait SpanDetail: Send + Sync + fmt::Debug {
    /// Returns the human-readable span description, e.g. the SQL text.
    fn description(&self) -> String;

    /// Returns additional key/value context for the span.
    fn context(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Caller-supplied description of a root span (the span that starts a trace).
pub trait RootSpanDetail: SpanDetail {
    /// Returns the user the trace is attributed to, if known.
    fn username(&self) -> Option<String> {
        None
    }
}

/// A ready-made detail for plugins without their own detail type.
///
/// ## Example
///
/// ```rust
/// use tracehook::span::{MessageDetail, RootSpanDetail, SpanDetail};
///
/// let detail = MessageDetail::new("GET /orders")
///     .with_context("method", "GET")
///     .with_username("alice");
///
/// assert_eq!(detail.description(), "GET /orders");
/// assert_eq!(detail.username().as_deref(), Some("alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDetail {
    description: String,
    context: Vec<(String, String)>,
    username: Option<String>,
}

impl MessageDetail {
    /// Creates a detail with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), context: Vec::new(), username: None }
    }

    /// Adds a context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Sets the username reported for a root span.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl SpanDetail for MessageDetail {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn context(&self) -> Vec<(String, String)> {
        self.context.clone()
    }
}

impl RootSpanDetail for MessageDetail {
    fn username(&self) -> Option<String> {
        self.username.clone()
    }
}
