//! # Core Error Types
//!
//! Recoverable failures of the lifecycle core. Programmer errors (duplicate
//! pool registration, identifier exhaustion, double bookkeeping) are not
//! represented here: they panic.

use thiserror::Error;

/// Errors that can occur while setting up the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A dependency was not registered in the service locator.
    #[error("required service not registered: {0}")]
    MissingService(&'static str),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration {path}: {reason}")]
    ConfigRead {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        reason: String,
    },

    /// Configuration text is not valid TOML for the expected schema.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A component pool is already borrowed, e.g. by an iteration that is
    /// dispatching events.
    #[error("component pool is borrowed: {0}")]
    PoolBusy(&'static str),
}

impl CoreError {
    /// Builds a [`CoreError::MissingService`] naming `T`.
    #[must_use]
    pub fn missing<T: ?Sized>() -> Self {
        Self::MissingService(std::any::type_name::<T>())
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
