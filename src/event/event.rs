//! Event record passed through the bus tree

use std::collections::HashSet;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Subscription priority levels
///
/// Subscribers with higher priority are invoked first; ties fire in
/// subscription order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// A typed notification passed through a bus tree
///
/// Created on publish, mutated only by handlers during dispatch, discarded
/// after the publish call returns. The two flags let a handler
/// short-circuit dispatch: `handled` stops the remaining same-bus
/// subscribers, `propagate = false` stops cross-bus forwarding.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event type key used for subscriber lookup
    pub event_type: String,
    /// Opaque payload
    pub payload: Value,
    /// Originator, informational only
    pub source: Option<String>,
    /// Unique id assigned at creation
    pub id: Uuid,
    /// Creation time
    pub timestamp: SystemTime,
    /// Whether the event should keep propagating across the bus tree
    pub propagate: bool,
    /// Whether a handler has claimed the event
    pub handled: bool,
    /// Buses this event has already been dispatched on. Bounds delivery to
    /// once per bus even though propagation runs both up and down the tree.
    pub(crate) visited: HashSet<u64>,
}

impl Event {
    /// Create a new event of `event_type` carrying `payload`
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            source: None,
            id: Uuid::new_v4(),
            timestamp: SystemTime::now(),
            propagate: true,
            handled: false,
            visited: HashSet::new(),
        }
    }

    /// Attach an informational source tag
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Stop further cross-bus propagation
    pub fn stop_propagation(&mut self) {
        self.propagate = false;
    }

    /// Claim the event: remaining same-bus subscribers are skipped and the
    /// event no longer propagates to other buses
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_ordering() {
        assert!(EventPriority::Low < EventPriority::Normal);
        assert!(EventPriority::Normal < EventPriority::High);
        assert!(EventPriority::High < EventPriority::Critical);
        assert_eq!(EventPriority::default(), EventPriority::Normal);
    }

    #[test]
    fn test_event_flags() {
        let mut event = Event::new("test.created", json!({"n": 1})).with_source("unit");
        assert!(event.propagate);
        assert!(!event.handled);

        event.mark_handled();
        event.stop_propagation();
        assert!(event.handled);
        assert!(!event.propagate);
        assert_eq!(event.source.as_deref(), Some("unit"));
    }

    #[test]
    fn test_unique_ids() {
        let a = Event::new("test", Value::Null);
        let b = Event::new("test", Value::Null);
        assert_ne!(a.id, b.id);
    }
}
