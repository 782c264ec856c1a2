//! Module behavior contract and lifecycle states
//!
//! Defines the trait concrete processing units implement and the lifecycle
//! state machine the tree drives them through.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::module::node::Module;

/// Module lifecycle state
///
/// ```text
/// UNINITIALIZED --initialize()--> INITIALIZING
/// INITIALIZING  --Ok(true)-----> ACTIVE
/// INITIALIZING  --Ok(false)/Err-> ERROR
/// any non-terminal --shutdown()-> DISABLED   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleStatus {
    /// Created, not yet initialized
    Uninitialized,
    /// `initialize()` in progress
    Initializing,
    /// Initialization succeeded; the module accepts work
    Active,
    /// Initialization failed; not retried automatically
    Error,
    /// Shut down; permanently inert
    Disabled,
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModuleStatus::Uninitialized => "UNINITIALIZED",
            ModuleStatus::Initializing => "INITIALIZING",
            ModuleStatus::Active => "ACTIVE",
            ModuleStatus::Error => "ERROR",
            ModuleStatus::Disabled => "DISABLED",
        };
        f.write_str(name)
    }
}

/// Contract implemented by concrete processing units
///
/// Implementations are plugged into a [`Module`] node at construction. The
/// node passes itself into each call so behaviors can reach their bus,
/// state store, and children without holding references of their own.
pub trait ModuleBehavior: Send + Sync {
    /// Prepare the unit for processing
    ///
    /// `Ok(true)` activates the module; `Ok(false)` or an error leaves it
    /// in the `ERROR` state.
    fn initialize(&self, module: &Module) -> Result<bool, CoreError> {
        let _ = module;
        Ok(true)
    }

    /// Whether this unit can handle `data`
    fn can_process(&self, data: &Value) -> bool {
        let _ = data;
        true
    }

    /// Run the unit against `data`
    fn process(
        &self,
        module: &Module,
        data: Value,
        context: Option<Value>,
    ) -> Result<Value, CoreError>;

    /// Hook invoked once, right before the module is disabled
    fn on_shutdown(&self, module: &Module) {
        let _ = module;
    }
}

/// Structural no-op behavior
///
/// Backs grouping nodes that exist only to carry children, a bus, and a
/// state scope.
#[derive(Debug, Default)]
pub struct NullBehavior;

impl ModuleBehavior for NullBehavior {
    fn process(
        &self,
        _module: &Module,
        data: Value,
        _context: Option<Value>,
    ) -> Result<Value, CoreError> {
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_names() {
        assert_eq!(ModuleStatus::Uninitialized.to_string(), "UNINITIALIZED");
        assert_eq!(ModuleStatus::Active.to_string(), "ACTIVE");
        assert_eq!(ModuleStatus::Disabled.to_string(), "DISABLED");
    }

    #[test]
    fn test_status_serde_names() {
        let s = serde_json::to_string(&ModuleStatus::Error).unwrap();
        assert_eq!(s, "\"ERROR\"");
    }
}
