//! # Entities and Components
//!
//! Entities are bare generational handles. Components are plain data stored
//! per type and keyed by handle. Structural changes are deferred and applied
//! at an explicit checkpoint.
//!
//! ## Design Philosophy
//!
//! - A handle names one incarnation of a slot; stale handles never alias
//! - Entity create/destroy is queued and drained by `process_commands`
//! - Component lifetime is bounded by entity lifetime via `EntityDestroyed`
//! - Component storage never moves a live value

mod component;
mod component_registry;
mod handle;
mod registry;
mod storage;

pub use component::Component;
pub use component_registry::ComponentRegistry;
pub use handle::{Handle, INVALID_IDENTIFIER};
pub use registry::{EntityCreated, EntityDestroyed, EntityRegistry, ProcessStats};
pub use storage::ComponentPool;
