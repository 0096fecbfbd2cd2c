//! # Gameplay Systems
//!
//! Systems built on the core. Each one follows the same shape:
//! - acquires its dependencies from the `ServiceLocator` in `initialize`
//! - listens to typed events through scoped receivers
//! - does its per-tick work in `update`

pub mod health;

pub use health::{Damaged, Health, HealthSystem, Killed, DEFAULT_HEALTH};
