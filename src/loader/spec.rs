//! Declarative module-tree specification records

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Top-level declarative tree description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    /// Root module entries; each becomes a registered tree root
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

/// One module entry in the declarative tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Factory namespace (e.g. `"pipeline.analysis"`)
    pub module_path: String,
    /// Variant name within the namespace
    pub class_name: String,
    /// Module id, unique among siblings
    pub id: String,
    /// Constructor arguments forwarded to the factory
    #[serde(default)]
    pub kwargs: HashMap<String, Value>,
    /// Child entries, recursively
    #[serde(default)]
    pub children: Vec<ModuleSpec>,
}

impl TreeSpec {
    /// Load a tree description from disk
    ///
    /// `.json` files parse as JSON; everything else parses as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CoreError::InvalidSpec(format!("Failed to read spec file: {}", e)))?;

        let spec: TreeSpec = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents)
                .map_err(|e| CoreError::InvalidSpec(format!("Failed to parse spec JSON: {}", e)))?
        } else {
            toml::from_str(&contents)
                .map_err(|e| CoreError::InvalidSpec(format!("Failed to parse spec TOML: {}", e)))?
        };

        spec.validate()?;
        Ok(spec)
    }

    /// Check required fields across the whole tree
    pub fn validate(&self) -> Result<(), CoreError> {
        for module in &self.modules {
            module.validate()?;
        }
        Ok(())
    }
}

impl ModuleSpec {
    fn validate(&self) -> Result<(), CoreError> {
        if self.id.is_empty() {
            return Err(CoreError::InvalidSpec("Module id cannot be empty".to_string()));
        }
        if self.module_path.is_empty() || self.class_name.is_empty() {
            return Err(CoreError::InvalidSpec(format!(
                "Module {} has an empty factory locator",
                self.id
            )));
        }
        for child in &self.children {
            child.validate()?;
        }
        Ok(())
    }
}
