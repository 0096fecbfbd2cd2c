//! # KEYSTONE
//!
//! Tick driver and reference gameplay built on `keystone_core`.
//!
//! ## Modules
//!
//! - `config`: one TOML file for the core and the driver
//! - `input`: bounded input channel feeding the tick thread
//! - `game_loop`: tick orchestration and statistics
//! - `gameplay`: systems (health, damage, death)

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod game_loop;
pub mod gameplay;
pub mod input;

// Re-export the core
pub use keystone_core as core;

pub use config::{HealthConfig, KeystoneConfig, SimConfig, TickConfig, DEFAULT_CONFIG_PATH};
pub use game_loop::{TickDriver, TickStats, TickStatsAccumulator};
pub use gameplay::{Damaged, Health, HealthSystem, Killed};
pub use input::{InputCommand, InputSender};
