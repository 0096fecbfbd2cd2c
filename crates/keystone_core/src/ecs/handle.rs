//! # Entity Handles
//!
//! Entities are opaque identities. A handle names one slot and one
//! incarnation of that slot:
//! - An identifier (1-based slot number, 0 is the invalid sentinel)
//! - A generation counter for detecting stale references

use std::fmt;

/// Identifier value reserved for "no entity".
pub const INVALID_IDENTIFIER: u32 = 0;

/// Value handle naming an entity.
///
/// The handle is packed into one `u64`:
/// - Lower 32 bits: identifier (1-based slot number)
/// - Upper 32 bits: generation of the slot when the handle was issued
///
/// Handles are plain values. Holding one never keeps anything alive and
/// can never dangle; use [`EntityRegistry::is_handle_valid`] to ask whether
/// the entity it names still exists.
///
/// [`EntityRegistry::is_handle_valid`]: crate::EntityRegistry::is_handle_valid
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    /// The invalid handle (identifier 0, generation 0).
    pub const INVALID: Self = Self(0);

    /// Creates a handle from identifier and generation.
    ///
    /// # Arguments
    ///
    /// * `identifier` - 1-based slot number (0 means invalid)
    /// * `generation` - Incarnation counter of the slot
    #[inline]
    #[must_use]
    pub const fn new(identifier: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (identifier as u64))
    }

    /// Returns the identifier portion of the handle.
    #[inline]
    #[must_use]
    pub const fn identifier(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the zero-based slot index, or `None` for the sentinel.
    #[inline]
    #[must_use]
    pub const fn slot_index(self) -> Option<usize> {
        match self.identifier() {
            INVALID_IDENTIFIER => None,
            id => Some(id as usize - 1),
        }
    }

    /// Checks whether this is the sentinel identifier.
    ///
    /// A non-null handle may still be stale.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.identifier() == INVALID_IDENTIFIER
    }

    /// Returns the same identifier one generation later.
    #[inline]
    #[must_use]
    pub(crate) const fn next_generation(self) -> Self {
        Self::new(self.identifier(), self.generation() + 1)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.identifier(), self.generation())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.identifier(), self.generation())
    }
}
