//! # KEYSTONE Core
//!
//! Object lifecycle for a game-style simulation:
//! - Generational entity handles with deferred create/destroy
//! - Per-type component pools bound to entity lifetime
//! - Typed synchronous events with scoped receivers
//! - A service locator and a two-phase `initialize`/`cleanup` contract
//!
//! ## Architecture Rules
//!
//! 1. **Single-threaded** - shared state is `Rc` + `RefCell`, never locked
//! 2. **Deferred structure** - the live entity set changes only in `process_commands`
//! 3. **No dangling subscribers** - receivers unlink themselves on drop
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use keystone_core::{EntityCreated, EntityRegistry, EventHub, Lifecycle, Receiver, ServiceLocator};
//!
//! let hub = Rc::new(EventHub::new());
//! let mut services = ServiceLocator::new();
//! services.set(Rc::clone(&hub));
//!
//! let mut entities = EntityRegistry::new();
//! entities.initialize(&services).unwrap();
//!
//! let mut on_created = Receiver::bind(|e: &EntityCreated| println!("spawned {}", e.handle));
//! hub.subscribe(&mut on_created);
//!
//! let player = entities.create_entity();
//! assert!(entities.is_handle_valid(player));
//! entities.process_commands();
//! assert_eq!(entities.live_count(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod memory;
pub mod services;

pub use config::{ComponentConfig, CoreConfig, EntityConfig};
pub use ecs::{
    Component, ComponentPool, ComponentRegistry, EntityCreated, EntityDestroyed, EntityRegistry,
    Handle, ProcessStats,
};
pub use error::{CoreError, CoreResult};
pub use events::{Dispatcher, EventHub, Receiver, SubscriptionId};
pub use lifecycle::Lifecycle;
pub use services::ServiceLocator;
