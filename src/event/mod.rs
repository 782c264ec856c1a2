//! Event record and hierarchical event bus
//!
//! Events are typed notifications dispatched to priority-ordered
//! subscribers; unhandled events propagate across the bus tree.

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventCallback};
pub use event::{Event, EventPriority};
