//! # Component Pool
//!
//! Storage for one component type, keyed by entity handle.
//!
//! Values live in a [`PagedSlab`], so a component never moves while it is
//! attached: the address seen by one lookup is the address seen by the next,
//! however many other entries are created or removed in between.

use std::collections::HashMap;

use super::component::Component;
use super::handle::Handle;
use crate::memory::{PagedSlab, SlabKey};

struct Entry<T> {
    handle: Handle,
    value: T,
}

/// Handle-keyed storage for components of type `T`.
///
/// At most one `T` per handle. The pool does not validate handles itself;
/// [`ComponentRegistry`](super::ComponentRegistry) checks them against the
/// entity registry and removes entries when their entity is destroyed.
///
/// # Type Parameters
///
/// * `T` - The component type to store
pub struct ComponentPool<T: Component> {
    /// Handle -> slab slot.
    index: HashMap<Handle, SlabKey>,
    /// The component values.
    entries: PagedSlab<Entry<T>>,
}

impl<T: Component> ComponentPool<T> {
    /// Creates an empty pool.
    ///
    /// # Arguments
    ///
    /// * `page_size` - Components per storage page
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            index: HashMap::new(),
            entries: PagedSlab::new(page_size),
        }
    }

    /// Default-constructs a component for `handle`.
    ///
    /// Returns `None` and leaves the existing value untouched if `handle`
    /// already has one.
    pub fn create(&mut self, handle: Handle) -> Option<&mut T> {
        if self.index.contains_key(&handle) {
            return None;
        }
        let key = self.entries.insert(Entry {
            handle,
            value: T::default(),
        });
        self.index.insert(handle, key);
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Gets the component attached to `handle`.
    #[inline]
    #[must_use]
    pub fn lookup(&self, handle: Handle) -> Option<&T> {
        let key = *self.index.get(&handle)?;
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Gets the component attached to `handle` mutably.
    #[inline]
    pub fn lookup_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let key = *self.index.get(&handle)?;
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Detaches and returns the component for `handle`.
    ///
    /// No-op if there is none.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let key = self.index.remove(&handle)?;
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Returns `true` if `handle` has a component in this pool.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.index.contains_key(&handle)
    }

    /// Returns the number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the pool is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterates over `(handle, component)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.entries
            .iter()
            .map(|(_, entry)| (entry.handle, &entry.value))
    }

    /// Iterates mutably over `(handle, component)` pairs in storage order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.entries
            .iter_mut()
            .map(|(_, entry)| (entry.handle, &mut entry.value))
    }

    /// Drops every component. Storage pages are kept.
    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }
}

impl<T: Component> std::fmt::Debug for ComponentPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentPool")
            .field("component", &std::any::type_name::<T>())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Health {
        current: i32,
    }

    #[test]
    fn test_create_default_constructs() {
        let mut pool: ComponentPool<Health> = ComponentPool::new(4);
        let h = Handle::new(1, 0);

        let health = pool.create(h).unwrap();
        assert_eq!(health.current, 0);
        health.current = 100;

        assert_eq!(pool.lookup(h), Some(&Health { current: 100 }));
    }

    #[test]
    fn test_duplicate_create_keeps_value() {
        let mut pool: ComponentPool<Health> = ComponentPool::new(4);
        let h = Handle::new(1, 0);
        pool.create(h).unwrap().current = 7;

        assert!(pool.create(h).is_none());
        assert_eq!(pool.lookup(h).unwrap().current, 7);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_generations_are_distinct_keys() {
        let mut pool: ComponentPool<Health> = ComponentPool::new(4);
        let old = Handle::new(1, 0);
        let new = Handle::new(1, 1);
        pool.create(old).unwrap().current = 1;

        assert!(pool.lookup(new).is_none());
        assert!(pool.create(new).is_some());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut pool: ComponentPool<Health> = ComponentPool::new(4);
        let h = Handle::new(3, 0);
        pool.create(h).unwrap().current = 5;

        assert_eq!(pool.remove(h), Some(Health { current: 5 }));
        assert_eq!(pool.remove(h), None);
        assert!(!pool.contains(h));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_address_stable_while_pool_grows() {
        let mut pool: ComponentPool<Health> = ComponentPool::new(2);
        let first = Handle::new(1, 0);
        pool.create(first);
        let before: *const Health = pool.lookup(first).unwrap();

        for id in 2..200 {
            pool.create(Handle::new(id, 0));
        }
        for id in (2..200).step_by(3) {
            pool.remove(Handle::new(id, 0));
        }

        let after: *const Health = pool.lookup(first).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_iter_yields_handles() {
        let mut pool: ComponentPool<Health> = ComponentPool::new(8);
        for id in 1..=3 {
            pool.create(Handle::new(id, 0)).unwrap().current = id as i32;
        }
        for (_, health) in pool.iter_mut() {
            health.current *= 10;
        }

        let mut seen: Vec<_> = pool.iter().map(|(h, v)| (h.identifier(), v.current)).collect();
        seen.sort_unstable();
        assert_eq!(seen, [(1, 10), (2, 20), (3, 30)]);

        pool.clear();
        assert_eq!(pool.iter().count(), 0);
    }
}
