//! Static factory table for module variants
//!
//! Variant resolution is an explicit startup-time registry keyed by the
//! spec's `(module_path, class_name)` locator. There is no reflective
//! symbol lookup: unknown locators fail fast at load time.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CoreError;
use crate::module::traits::ModuleBehavior;

/// Builds a behavior from the spec entry's `kwargs`
pub type ModuleFactory =
    Arc<dyn Fn(&HashMap<String, Value>) -> Result<Box<dyn ModuleBehavior>, CoreError> + Send + Sync>;

/// Maps variant locators to factory functions
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, ModuleFactory>,
}

impl FactoryRegistry {
    /// Create an empty factory table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `module_path` + `class_name`
    ///
    /// Re-registering a locator replaces the previous factory.
    pub fn register<F>(&mut self, module_path: &str, class_name: &str, factory: F)
    where
        F: Fn(&HashMap<String, Value>) -> Result<Box<dyn ModuleBehavior>, CoreError>
            + Send
            + Sync
            + 'static,
    {
        self.factories
            .insert(Self::key(module_path, class_name), Arc::new(factory));
    }

    /// Resolve the factory for a variant locator
    pub fn resolve(
        &self,
        module_path: &str,
        class_name: &str,
    ) -> Result<ModuleFactory, CoreError> {
        let key = Self::key(module_path, class_name);
        self.factories
            .get(&key)
            .cloned()
            .ok_or(CoreError::FactoryNotFound(key))
    }

    /// Whether a factory is registered for the locator
    pub fn contains(&self, module_path: &str, class_name: &str) -> bool {
        self.factories
            .contains_key(&Self::key(module_path, class_name))
    }

    fn key(module_path: &str, class_name: &str) -> String {
        format!("{}::{}", module_path, class_name)
    }
}
