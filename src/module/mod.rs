//! Module abstraction, lifecycle, and registry
//!
//! A module is the unit of composition: it owns one event bus, one state
//! store, and a set of child modules, and is driven through the lifecycle
//! state machine by the registry.

pub mod info;
pub mod node;
pub mod registry;
pub mod traits;

pub use info::ModuleInfo;
pub use node::Module;
pub use registry::ModuleRegistry;
pub use traits::{ModuleBehavior, ModuleStatus, NullBehavior};
