//! Module tree node
//!
//! A module owns exactly one event bus, one state store, and its children.
//! Constructing a module under a parent chains the bus and store to the
//! parent's and registers the module in the parent's child map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::event::EventBus;
use crate::module::info::ModuleInfo;
use crate::module::traits::{ModuleBehavior, ModuleStatus};
use crate::state::StateStore;

/// The unit of composition
///
/// Parent links are weak back-references; a parent exclusively owns its
/// children, so destruction order is simply "drop children first".
pub struct Module {
    id: String,
    parent: Option<Weak<Module>>,
    children: Mutex<BTreeMap<String, Arc<Module>>>,
    status: Mutex<ModuleStatus>,
    error: Mutex<Option<String>>,
    event_bus: Arc<EventBus>,
    state: Arc<StateStore>,
    behavior: Box<dyn ModuleBehavior>,
}

impl Module {
    /// Create a module and attach it under `parent` if one is given
    ///
    /// With a parent, the new module's bus and store continue the parent's
    /// chains and the module registers itself in the parent's child map;
    /// without one it is a tree root with a standalone bus and store.
    pub fn new(
        id: impl Into<String>,
        parent: Option<&Arc<Module>>,
        behavior: Box<dyn ModuleBehavior>,
    ) -> Arc<Self> {
        let id = id.into();
        let (event_bus, state, parent_ref) = match parent {
            Some(parent) => {
                let bus = EventBus::with_parent(&parent.event_bus);
                let store = StateStore::with_parent(&parent.state, Arc::clone(&bus));
                (bus, store, Some(Arc::downgrade(parent)))
            }
            None => {
                let bus = EventBus::new();
                let store = StateStore::new(Arc::clone(&bus));
                (bus, store, None)
            }
        };

        let module = Arc::new(Self {
            id,
            parent: parent_ref,
            children: Mutex::new(BTreeMap::new()),
            status: Mutex::new(ModuleStatus::Uninitialized),
            error: Mutex::new(None),
            event_bus,
            state,
            behavior,
        });

        if let Some(parent) = parent {
            parent.add_child(Arc::clone(&module));
        }
        module
    }

    /// Module id, unique among siblings
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state
    pub fn status(&self) -> ModuleStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last initialization failure, if any
    pub fn error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The bus owned by this module
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// The state store owned by this module
    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Parent module, if still alive
    pub fn parent(&self) -> Option<Arc<Module>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Insert `child` into the child map
    ///
    /// Children normally attach through [`Module::new`], which builds them
    /// with this module as parent so their bus and store chains are
    /// already linked. A sibling id collision replaces the previous child.
    pub fn add_child(&self, child: Arc<Module>) {
        let mut children = self
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if children
            .insert(child.id().to_string(), child)
            .is_some()
        {
            warn!("Replaced existing child module under {}", self.id);
        }
    }

    /// Remove and return the child with `id`
    pub fn remove_child(&self, id: &str) -> Option<Arc<Module>> {
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Direct child with `id`
    pub fn get_child(&self, id: &str) -> Option<Arc<Module>> {
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Snapshot of the current children, in deterministic id order
    pub fn children(&self) -> Vec<Arc<Module>> {
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Resolve `path` segment by segment through the subtree
    ///
    /// The first segment names a direct child; resolution of the rest is
    /// delegated to it. Any missing segment yields `None`.
    pub fn get_descendant(&self, path: &[&str]) -> Option<Arc<Module>> {
        let (first, rest) = path.split_first()?;
        let child = self.get_child(first)?;
        if rest.is_empty() {
            Some(child)
        } else {
            child.get_descendant(rest)
        }
    }

    /// Ids along the parent chain, root first
    pub fn get_path(&self) -> Vec<String> {
        let mut path = match self.parent() {
            Some(parent) => parent.get_path(),
            None => Vec::new(),
        };
        path.push(self.id.clone());
        path
    }

    /// Dotted id from the tree root
    pub fn full_id(&self) -> String {
        self.get_path().join(".")
    }

    /// Run the initialization state machine
    ///
    /// Transitions to `INITIALIZING`, calls the behavior, and lands on
    /// `ACTIVE` or `ERROR` (recording the failure). Returns whether the
    /// module ended up active. A disabled module stays inert.
    pub fn initialize(&self) -> bool {
        if self.status() == ModuleStatus::Disabled {
            warn!("Ignoring initialize() on disabled module {}", self.full_id());
            return false;
        }
        self.set_status(ModuleStatus::Initializing);
        debug!("Initializing module {}", self.full_id());

        match self.behavior.initialize(self) {
            Ok(true) => {
                self.set_status(ModuleStatus::Active);
                info!("Module {} active", self.full_id());
                true
            }
            Ok(false) => {
                self.record_error("initialize() returned false");
                false
            }
            Err(e) => {
                self.record_error(&e.to_string());
                false
            }
        }
    }

    /// Whether the behavior can handle `data`
    pub fn can_process(&self, data: &Value) -> bool {
        self.behavior.can_process(data)
    }

    /// Run the behavior against `data`
    ///
    /// Only `ACTIVE` modules accept work.
    pub fn process(&self, data: Value, context: Option<Value>) -> Result<Value, CoreError> {
        let status = self.status();
        if status != ModuleStatus::Active {
            return Err(CoreError::OperationError(format!(
                "module {} is {}, not ACTIVE",
                self.full_id(),
                status
            )));
        }
        self.behavior.process(self, data, context)
    }

    /// Shut down the subtree: every current child first, then this module
    ///
    /// Safe to call twice; the second call only re-iterates children.
    pub fn shutdown(&self) {
        for child in self.children() {
            child.shutdown();
        }
        if self.status() == ModuleStatus::Disabled {
            return;
        }
        self.behavior.on_shutdown(self);
        self.set_status(ModuleStatus::Disabled);
        info!("Module {} disabled", self.full_id());
    }

    /// Snapshot this subtree for introspection
    pub fn describe(&self) -> ModuleInfo {
        ModuleInfo {
            id: self.id.clone(),
            full_id: self.full_id(),
            status: self.status(),
            error: self.error(),
            children: self.children().iter().map(|c| c.describe()).collect(),
        }
    }

    fn set_status(&self, status: ModuleStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    fn record_error(&self, message: &str) {
        warn!("Module {} failed to initialize: {}", self.full_id(), message);
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
        self.set_status(ModuleStatus::Error);
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
