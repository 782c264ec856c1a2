//! Priority-ordered publish/subscribe bus, linked into a tree of buses
//!
//! Each bus dispatches to its own subscribers in priority order, then
//! forwards unhandled events to its parent and to its children. Locks are
//! held only while the subscriber table is touched, never across a
//! callback, so handlers may publish again on any bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::event::event::{Event, EventPriority};

/// Callback invoked for every published event of a subscribed type
pub type EventCallback = Arc<dyn Fn(&mut Event) -> Result<(), CoreError> + Send + Sync>;

struct Subscription {
    callback: EventCallback,
    priority: EventPriority,
}

static NEXT_BUS_ID: AtomicU64 = AtomicU64::new(0);

/// A node in a tree of publish/subscribe routers
///
/// The parent link is fixed at construction and never reassigned; children
/// register themselves at construction and are held as weak back-references
/// only, so dropping a child module is enough to detach its bus.
pub struct EventBus {
    bus_id: u64,
    subscribers: Mutex<HashMap<String, Vec<Subscription>>>,
    parent: Option<Weak<EventBus>>,
    children: Mutex<Vec<Weak<EventBus>>>,
}

impl EventBus {
    /// Create a standalone root bus
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bus_id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
            subscribers: Mutex::new(HashMap::new()),
            parent: None,
            children: Mutex::new(Vec::new()),
        })
    }

    /// Create a bus linked under `parent`
    ///
    /// The new bus registers itself in the parent's child list; the parent
    /// never keeps it alive.
    pub fn with_parent(parent: &Arc<EventBus>) -> Arc<Self> {
        let bus = Arc::new(Self {
            bus_id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
            subscribers: Mutex::new(HashMap::new()),
            parent: Some(Arc::downgrade(parent)),
            children: Mutex::new(Vec::new()),
        });
        parent
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&bus));
        bus
    }

    /// Subscribe `callback` to events of `event_type`
    ///
    /// Subscribers fire in descending priority order; equal priorities fire
    /// in subscription order.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        callback: EventCallback,
        priority: EventPriority,
    ) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let list = subscribers.entry(event_type.into()).or_default();
        list.push(Subscription { callback, priority });
        // Stable sort keeps subscription order within a priority level
        list.sort_by_key(|s| std::cmp::Reverse(s.priority));
    }

    /// Remove every subscription of `callback` under `event_type`,
    /// regardless of the priority it was registered with
    pub fn unsubscribe(&self, event_type: &str, callback: &EventCallback) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = subscribers.get_mut(event_type) {
            list.retain(|s| !Arc::ptr_eq(&s.callback, callback));
            if list.is_empty() {
                subscribers.remove(event_type);
            }
        }
    }

    /// Number of subscriptions currently registered for `event_type`
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Publish a new event of `event_type` and return it after dispatch
    pub fn publish(
        &self,
        event_type: impl Into<String>,
        payload: Value,
        source: Option<&str>,
    ) -> Event {
        let mut event = Event::new(event_type, payload);
        if let Some(source) = source {
            event.source = Some(source.to_string());
        }
        self.dispatch(&mut event);
        event
    }

    /// Publish a pre-built event and return it after dispatch
    pub fn publish_event(&self, mut event: Event) -> Event {
        self.dispatch(&mut event);
        event
    }

    /// Dispatch locally, then propagate parent-first across the tree
    fn dispatch(&self, event: &mut Event) {
        // Each bus sees a given event at most once; propagation runs both
        // up and down, so ancestors would otherwise redeliver to us.
        if !event.visited.insert(self.bus_id) {
            return;
        }

        let callbacks: Vec<EventCallback> = {
            let subscribers = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subscribers
                .get(&event.event_type)
                .map(|list| list.iter().map(|s| Arc::clone(&s.callback)).collect())
                .unwrap_or_default()
        };

        debug!(
            "Dispatching event {} to {} local subscriber(s)",
            event.event_type,
            callbacks.len()
        );

        for callback in callbacks {
            if let Err(e) = callback(event) {
                warn!("Event handler failed for {}: {}", event.event_type, e);
            }
            if event.handled {
                break;
            }
        }

        // Propagation order is parent before children, globally consistent.
        if event.propagate && !event.handled {
            if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
                parent.dispatch(event);
            }
        }
        if event.propagate && !event.handled {
            let children: Vec<Arc<EventBus>> = {
                let mut children = self
                    .children
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                children.retain(|child| child.strong_count() > 0);
                children.iter().filter_map(Weak::upgrade).collect()
            };
            for child in children {
                child.dispatch(event);
            }
        }
    }
}
