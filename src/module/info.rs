//! Serializable module-tree snapshots

use serde::{Deserialize, Serialize};

use crate::module::traits::ModuleStatus;

/// Snapshot of a module subtree for introspection
///
/// Produced by [`Module::describe`](crate::module::Module::describe);
/// children appear in the same deterministic order the tree iterates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Module id, unique among siblings
    pub id: String,
    /// Dotted path from the tree root
    pub full_id: String,
    /// Lifecycle state at snapshot time
    pub status: ModuleStatus,
    /// Last initialization failure, if any
    pub error: Option<String>,
    /// Child snapshots, recursively
    #[serde(default)]
    pub children: Vec<ModuleInfo>,
}
