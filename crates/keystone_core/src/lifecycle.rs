//! # Lifecycle Contract
//!
//! Every core component is brought up and torn down the same way:
//!
//! ```text
//! initialize(services) ──> cleanup() ──> acquire dependencies ──> Ok / Err
//! cleanup()            ──> release everything (safe to repeat)
//! ```

use crate::error::CoreResult;
use crate::services::ServiceLocator;

/// Two-phase setup shared by the core components and the systems built on them.
pub trait Lifecycle {
    /// Acquires dependencies from `services`.
    ///
    /// Implementations call [`Lifecycle::cleanup`] first, so initializing
    /// twice is the same as initializing once. On failure the object is left
    /// cleaned up and the call may be retried with corrected inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if a required service is missing or a configuration
    /// value is out of range.
    fn initialize(&mut self, services: &ServiceLocator) -> CoreResult<()>;

    /// Releases everything acquired by [`Lifecycle::initialize`].
    ///
    /// Always safe to call, including on a never-initialized object and
    /// repeatedly.
    fn cleanup(&mut self);
}
