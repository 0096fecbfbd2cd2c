//! # Core Configuration
//!
//! Sizing parameters for the core, loaded once at startup from TOML.
//!
//! ```toml
//! [entities]
//! initial_capacity = 1024
//! max_entities = 1_000_000
//!
//! [components]
//! page_size = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Entity table sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Slots reserved up front (the table still grows one slot at a time).
    pub initial_capacity: usize,
    /// Largest identifier the registry may hand out.
    pub max_entities: u32,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_entities: u32::MAX,
        }
    }
}

/// Component pool sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Entries per slab page. Pages are never reallocated once created.
    pub page_size: usize,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self { page_size: 256 }
    }
}

/// Configuration for the whole core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Entity registry settings.
    pub entities: EntityConfig,
    /// Component registry settings.
    pub components: ComponentConfig,
}

impl CoreConfig {
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
    /// the same errors as [`CoreConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every capacity is positive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> CoreResult<()> {
        if self.entities.max_entities == 0 {
            return Err(CoreError::InvalidConfig(
                "entities.max_entities must be greater than zero".into(),
            ));
        }
        if self.components.page_size == 0 {
            return Err(CoreError::InvalidConfig(
                "components.page_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
