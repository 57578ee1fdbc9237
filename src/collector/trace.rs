//! Trace records assembled by the collector.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    continuation::Outcome,
    engine::PluginId,
    span::{RootSpanDetail, SpanDetail},
};

/// A span recorded inside a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanRecord {
    /// Span description from its detail.
    pub description: String,
    /// Name of the metric the span was timed against.
    pub metric: String,
    /// Context entries from its detail.
    pub context: Vec<(String, String)>,
    /// Nesting depth; direct children of the root span are at depth 1.
    pub depth: usize,
    /// Start of the span relative to the start of the trace.
    pub offset: Duration,
    /// Span duration.
    pub duration: Duration,
    /// How the wrapped call finished.
    pub outcome: Outcome,
}

/// A finished trace, rooted at one root span.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTrace {
    /// Unique trace id.
    pub id: Uuid,
    /// Plugin that started the trace.
    pub plugin_id: String,
    /// Wall-clock start time.
    pub started_at: DateTime<Utc>,
    /// Root span duration.
    pub duration: Duration,
    /// Name of the root span metric.
    pub metric: String,
    /// Root span description.
    pub description: String,
    /// User the trace is attributed to.
    pub username: Option<String>,
    /// How the root call finished.
    pub outcome: Outcome,
    /// Nested spans in start order.
    pub spans: Vec<SpanRecord>,
    /// Trace attributes in insertion order.
    pub attributes: Vec<(String, String)>,
}

impl CompletedTrace {
    /// Returns the value of the first attribute named `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

/// A trace still running on some thread.
pub(crate) struct ActiveTrace {
    pub(crate) id: Uuid,
    pub(crate) plugin_id: PluginId,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) start_tick: u64,
    pub(crate) metric: String,
    pub(crate) detail: Arc<dyn RootSpanDetail>,
    pub(crate) depth: usize,
    pub(crate) spans: Vec<SpanRecord>,
    pub(crate) attributes: Vec<(String, String)>,
}

impl ActiveTrace {
    pub(crate) fn new(
        plugin_id: PluginId,
        metric: &str,
        detail: Arc<dyn RootSpanDetail>,
        start_tick: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            plugin_id,
            started_at: Utc::now(),
            start_tick,
            metric: metric.to_string(),
            detail,
            depth: 0,
            spans: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub(crate) fn complete(self, duration: Duration, outcome: Outcome) -> CompletedTrace {
        CompletedTrace {
            id: self.id,
            plugin_id: self.plugin_id.to_string(),
            started_at: self.started_at,
            duration,
            metric: self.metric,
            description: self.detail.description(),
            username: self.detail.username(),
            outcome,
            spans: self.spans,
            attributes: self.attributes,
        }
    }
}
