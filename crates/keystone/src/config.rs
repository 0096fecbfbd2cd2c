//! # Driver Configuration
//!
//! One TOML file configures the core and the driver:
//!
//! ```toml
//! [entities]      # keystone_core::EntityConfig
//! [components]    # keystone_core::ComponentConfig
//! [tick]          # TickConfig
//! [health]        # HealthConfig
//! [sim]           # SimConfig
//! ```

use std::path::Path;

use keystone_core::{CoreConfig, CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Default location of the configuration file, relative to the crate.
pub const DEFAULT_CONFIG_PATH: &str = "config/keystone.toml";

/// Tick loop settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Ticks to run before stopping. Zero means no limit.
    pub max_ticks: u64,
    /// Emit a progress log every this many ticks. Zero disables it.
    pub log_every: u64,
    /// Input commands that can be queued before producers see back-pressure.
    pub input_capacity: usize,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            max_ticks: 600,
            log_every: 60,
            input_capacity: 4096,
        }
    }
}

/// Health system tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Health assigned to newly spawned entities.
    pub max: i32,
    /// Health regained per tick by wounded entities.
    pub regen_per_tick: i32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max: 100,
            regen_per_tick: 1,
        }
    }
}

/// Input generated by the headless simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed; equal seeds replay identical runs.
    pub seed: u64,
    /// Entities spawned per tick.
    pub spawn_per_tick: u32,
    /// Attacks issued per tick against random live entities.
    pub attacks_per_tick: u32,
    /// Upper bound of a single attack's damage.
    pub max_damage: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            spawn_per_tick: 8,
            attacks_per_tick: 24,
            max_damage: 40,
        }
    }
}

/// Complete configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoneConfig {
    /// Core sizing (`[entities]`, `[components]`).
    #[serde(flatten)]
    pub core: CoreConfig,
    /// Tick loop.
    pub tick: TickConfig,
    /// Health system.
    pub health: HealthConfig,
    /// Simulation input.
    pub sim: SimConfig,
}

impl KeystoneConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigParse`] for malformed TOML and
    /// [`CoreError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigRead`] if the file cannot be read, otherwise
    /// the same errors as [`KeystoneConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> CoreResult<()> {
        self.core.validate()?;
        if self.tick.input_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "tick.input_capacity must be greater than zero".into(),
            ));
        }
        if self.health.max <= 0 {
            return Err(CoreError::InvalidConfig(
                "health.max must be greater than zero".into(),
            ));
        }
        if self.health.regen_per_tick < 0 {
            return Err(CoreError::InvalidConfig(
                "health.regen_per_tick must not be negative".into(),
            ));
        }
        if self.sim.max_damage <= 0 {
            return Err(CoreError::InvalidConfig(
                "sim.max_damage must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
