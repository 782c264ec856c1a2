//! Hierarchical key/value store with parent fallback and change notification
//!
//! Each store keeps local overrides only. Reads fall back through the
//! parent chain to the parent's *current* value; writes never touch the
//! parent. Every write notifies per-key watchers and then publishes a
//! structured [`STATE_CHANGED_EVENT`] on the store's event bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::{json, Value};
use tracing::warn;

use crate::error::CoreError;
use crate::event::{Event, EventBus};

/// Event type published on every state write
pub const STATE_CHANGED_EVENT: &str = "state.changed";

/// Callback invoked with `(new_value, old_value)` on every write to a
/// watched key
pub type WatchCallback = Arc<dyn Fn(&Value, Option<&Value>) -> Result<(), CoreError> + Send + Sync>;

/// A scoped key/value store layered over an [`EventBus`]
///
/// The parent link is read-fallback only and held weakly; a child store
/// never keeps its parent alive.
pub struct StateStore {
    state: Mutex<HashMap<String, Value>>,
    parent: Option<Weak<StateStore>>,
    watchers: Mutex<HashMap<String, Vec<WatchCallback>>>,
    event_bus: Arc<EventBus>,
}

impl StateStore {
    /// Create a standalone root store over `event_bus`
    pub fn new(event_bus: Arc<EventBus>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HashMap::new()),
            parent: None,
            watchers: Mutex::new(HashMap::new()),
            event_bus,
        })
    }

    /// Create a store that falls back to `parent` for missing keys
    pub fn with_parent(parent: &Arc<StateStore>, event_bus: Arc<EventBus>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HashMap::new()),
            parent: Some(Arc::downgrade(parent)),
            watchers: Mutex::new(HashMap::new()),
            event_bus,
        })
    }

    /// The bus this store publishes change events on
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Write `value` under `key`, notify watchers, publish a change event
    pub fn set(&self, key: impl Into<String>, value: Value, source: Option<&str>) {
        let key = key.into();
        let old_value = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), value.clone());

        let watchers: Vec<WatchCallback> = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .map(|list| list.iter().map(Arc::clone).collect())
            .unwrap_or_default();
        for watcher in watchers {
            if let Err(e) = watcher(&value, old_value.as_ref()) {
                warn!("State watcher failed for {}: {}", key, e);
            }
        }

        let mut event = Event::new(
            STATE_CHANGED_EVENT,
            json!({
                "key": key,
                "value": value,
                "old_value": old_value,
            }),
        );
        if let Some(source) = source {
            event.source = Some(source.to_string());
        }
        self.event_bus.publish_event(event);
    }

    /// Read `key`, falling back through the parent chain
    ///
    /// The fallback is a live read: it reflects the parent's current value,
    /// not a value captured when this store was created.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Some(value.clone());
        }
        self.parent.as_ref()?.upgrade()?.get(key)
    }

    /// Read `key` with a default for misses anywhere in the chain
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Register a per-key observer, independent of the event bus
    pub fn watch(&self, key: impl Into<String>, callback: WatchCallback) {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.into())
            .or_default()
            .push(callback);
    }

    /// Remove every registration of `callback` under `key`
    pub fn unwatch(&self, key: &str, callback: &WatchCallback) {
        let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = watchers.get_mut(key) {
            list.retain(|w| !Arc::ptr_eq(w, callback));
            if list.is_empty() {
                watchers.remove(key);
            }
        }
    }

    /// Copy of the visible state
    ///
    /// With `include_parent`, the parent's recursively merged state is the
    /// base and local entries overlay it, so local values win on collision.
    pub fn get_all(&self, include_parent: bool) -> HashMap<String, Value> {
        let mut merged = if include_parent {
            match self.parent.as_ref().and_then(Weak::upgrade) {
                Some(parent) => parent.get_all(true),
                None => HashMap::new(),
            }
        } else {
            HashMap::new()
        };
        merged.extend(
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        );
        merged
    }
}
