//! Module registry
//!
//! Owns root modules and keeps a flattened dotted-id index over every
//! registered subtree for O(1) lookup. Drives tree-wide initialization and
//! shutdown.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{info, warn};

use crate::module::info::ModuleInfo;
use crate::module::node::Module;

/// Holds root modules and a dotted-id → module index
///
/// The index is a secondary cache rebuilt incrementally on register and
/// unregister; it never owns a module beyond the root map's subtree.
#[derive(Default)]
pub struct ModuleRegistry {
    root_modules: BTreeMap<String, Arc<Module>>,
    module_cache: HashMap<String, Arc<Module>>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` as a root and index its whole subtree
    pub fn register_module(&mut self, module: Arc<Module>) {
        let id = module.id().to_string();
        info!("Registering module tree at {}", id);
        if self
            .root_modules
            .insert(id.clone(), Arc::clone(&module))
            .is_some()
        {
            warn!("Replacing previously registered root module {}", id);
            self.purge_subtree(&id);
        }
        self.cache_subtree(&module);
    }

    /// Remove the root with `id` and drop its subtree from the index
    pub fn unregister_module(&mut self, id: &str) -> Option<Arc<Module>> {
        let module = self.root_modules.remove(id)?;
        self.purge_subtree(id);
        info!("Unregistered module tree at {}", id);
        Some(module)
    }

    /// Look up a module by id
    ///
    /// Tries an exact root match, then the flattened index, then — for
    /// dotted ids — resolves the first segment as a root and walks the
    /// rest of the path. Misses return `None`.
    pub fn get_module(&self, id: &str) -> Option<Arc<Module>> {
        if let Some(module) = self.root_modules.get(id) {
            return Some(Arc::clone(module));
        }
        if let Some(module) = self.module_cache.get(id) {
            return Some(Arc::clone(module));
        }
        if let Some((root_id, rest)) = id.split_once('.') {
            let root = self.root_modules.get(root_id)?;
            let path: Vec<&str> = rest.split('.').collect();
            return root.get_descendant(&path);
        }
        None
    }

    /// Registered root modules, in deterministic id order
    pub fn roots(&self) -> Vec<Arc<Module>> {
        self.root_modules.values().cloned().collect()
    }

    /// Initialize every registered tree
    ///
    /// Each module runs its own state machine; a failing parent is left in
    /// `ERROR` and its children are still visited, since every module's
    /// lifecycle is independent of its parent's success.
    pub fn initialize_all(&self) {
        for root in self.root_modules.values() {
            Self::initialize_module(root);
        }
    }

    fn initialize_module(module: &Arc<Module>) {
        module.initialize();
        for child in module.children() {
            Self::initialize_module(&child);
        }
    }

    /// Shut down every registered tree, children before parents
    pub fn shutdown_all(&self) {
        info!("Shutting down {} module tree(s)", self.root_modules.len());
        for root in self.root_modules.values() {
            root.shutdown();
        }
    }

    /// Snapshot every registered tree for introspection
    pub fn describe_all(&self) -> Vec<ModuleInfo> {
        self.root_modules.values().map(|m| m.describe()).collect()
    }

    fn cache_subtree(&mut self, module: &Arc<Module>) {
        self.module_cache
            .insert(module.full_id(), Arc::clone(module));
        for child in module.children() {
            self.cache_subtree(&child);
        }
    }

    fn purge_subtree(&mut self, root_id: &str) {
        let prefix = format!("{}.", root_id);
        self.module_cache
            .retain(|key, _| key != root_id && !key.starts_with(&prefix));
    }
}
