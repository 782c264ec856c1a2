//! Modcore - Hierarchical module composition core
//!
//! This crate composes independently-developed processing units ("modules")
//! into a tree. Modules communicate without direct references through a
//! hierarchical event bus and share configuration and results through a
//! hierarchical state store with inheritance.
//!
//! ## Architecture
//!
//! Dependency order, leaves first:
//!
//! 1. [`Event`] - typed notification with mutable propagation/handled flags
//! 2. [`EventBus`] - priority-ordered pub/sub node, linked into a bus tree
//! 3. [`StateStore`] - scoped key/value store with parent fallback and watchers
//! 4. [`Module`] - unit of composition owning one bus/store pair and children
//! 5. [`ModuleRegistry`] - root ownership, dotted-id lookup, coordinated lifecycle
//! 6. [`ModuleLoader`] - builds registered trees from a declarative specification
//!
//! ## Design Principles
//!
//! 1. **No direct references**: modules interact only through events and state
//! 2. **Parent owns children**: back-references are weak, destruction is top-down
//! 3. **Synchronous dispatch**: `publish`/`set` return after the whole tree has
//!    seen the event, parent before children, with no lock held across callbacks
//! 4. **Isolated faults**: a failing handler, watcher, or `initialize()` never
//!    takes down its siblings
//!
//! ## Example
//!
//! ```rust
//! use modcore::{Module, ModuleRegistry, NullBehavior};
//!
//! let root = Module::new("pipeline", None, Box::new(NullBehavior));
//! let _stage = Module::new("analysis", Some(&root), Box::new(NullBehavior));
//!
//! let mut registry = ModuleRegistry::new();
//! registry.register_module(root);
//! registry.initialize_all();
//!
//! let stage = registry.get_module("pipeline.analysis").unwrap();
//! assert_eq!(stage.full_id(), "pipeline.analysis");
//! registry.shutdown_all();
//! ```

pub mod error;
pub mod event;
pub mod loader;
pub mod module;
pub mod state;

pub use error::CoreError;
pub use event::{Event, EventBus, EventCallback, EventPriority};
pub use loader::{FactoryRegistry, ModuleFactory, ModuleLoader, ModuleSpec, TreeSpec};
pub use module::{Module, ModuleBehavior, ModuleInfo, ModuleRegistry, ModuleStatus, NullBehavior};
pub use state::{StateStore, WatchCallback, STATE_CHANGED_EVENT};
