//! Module loader
//!
//! Builds module trees from a declarative specification, parent before
//! children, and registers every resulting root.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::CoreError;
use crate::loader::factory::FactoryRegistry;
use crate::loader::spec::{ModuleSpec, TreeSpec};
use crate::module::node::Module;
use crate::module::registry::ModuleRegistry;

/// Builds module trees from declarative specifications
pub struct ModuleLoader {
    factories: FactoryRegistry,
}

impl ModuleLoader {
    /// Create a loader over a populated factory table
    pub fn new(factories: FactoryRegistry) -> Self {
        Self { factories }
    }

    /// Instantiate one spec entry and, recursively, its children
    ///
    /// The module is constructed with the already-built parent, so it
    /// self-registers in the parent's child map and its bus and store
    /// continue the parent's chains. Resolution failures anywhere in the
    /// subtree abort the load.
    pub fn load_module_instance(
        &self,
        spec: &ModuleSpec,
        parent: Option<&Arc<Module>>,
    ) -> Result<Arc<Module>, CoreError> {
        let factory = self.factories.resolve(&spec.module_path, &spec.class_name)?;
        let behavior = factory(&spec.kwargs)?;
        let module = Module::new(&spec.id, parent, behavior);
        debug!("Loaded module {}", module.full_id());

        for child_spec in &spec.children {
            self.load_module_instance(child_spec, Some(&module))?;
        }
        Ok(module)
    }

    /// Build every tree described by `spec` and register the roots
    pub fn load_from_spec(
        &self,
        spec: &TreeSpec,
        registry: &mut ModuleRegistry,
    ) -> Result<Vec<Arc<Module>>, CoreError> {
        let mut roots = Vec::with_capacity(spec.modules.len());
        for module_spec in &spec.modules {
            let root = self.load_module_instance(module_spec, None)?;
            registry.register_module(Arc::clone(&root));
            roots.push(root);
        }
        info!("Loaded {} module tree(s)", roots.len());
        Ok(roots)
    }

    /// Read a declarative tree description from disk and load it
    pub fn load_from_config<P: AsRef<Path>>(
        &self,
        path: P,
        registry: &mut ModuleRegistry,
    ) -> Result<Vec<Arc<Module>>, CoreError> {
        let spec = TreeSpec::from_file(path)?;
        self.load_from_spec(&spec, registry)
    }
}
