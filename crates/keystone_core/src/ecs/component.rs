//! # Component System
//!
//! Components are plain data attached to entities. Behavior lives in
//! systems that look components up through the
//! [`ComponentRegistry`](super::ComponentRegistry).

/// Marker trait for component types.
///
/// Components must be:
/// - `Default`: `create` default-constructs the value in place
/// - `'static`: pools are indexed by [`TypeId`](std::any::TypeId)
///
/// Implemented automatically for every type that qualifies.
///
/// # Example
///
/// ```rust
/// #[derive(Default)]
/// struct Health {
///     current: i32,
/// }
///
/// fn assert_component<T: keystone_core::Component>() {}
/// assert_component::<Health>();
/// ```
pub trait Component: Default + 'static {}

impl<T: Default + 'static> Component for T {}
