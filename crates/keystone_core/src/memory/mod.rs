//! # Memory Management
//!
//! Storage with stable addressing for component data.
//!
//! ## Design Philosophy
//!
//! Component references handed out by a pool must stay valid while other
//! keys are inserted or removed, so storage grows in whole pages instead of
//! reallocating one contiguous array.

mod slab;

pub use slab::{PagedSlab, SlabKey};
