//! # Component Registry
//!
//! One [`ComponentPool`] per component type, each wired to the entity
//! lifecycle.
//!
//! Every pool owns a [`Receiver<EntityDestroyed>`] that removes the destroyed
//! entity's entry, so a component never outlives its entity. Creation is
//! checked against [`EntityRegistry::is_handle_valid`], so a component is
//! never attached to a dead entity in the first place.
//!
//! ## Borrowing
//!
//! Lookups hand out [`Ref`]/[`RefMut`] guards into the pool. Release them
//! before the next [`EntityRegistry::process_commands`]: the destroy receiver
//! needs the pool mutably and panics if it is still borrowed.

use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use super::component::Component;
use super::handle::Handle;
use super::registry::{EntityDestroyed, EntityRegistry};
use super::storage::ComponentPool;
use crate::config::ComponentConfig;
use crate::error::{CoreError, CoreResult};
use crate::events::{EventHub, Receiver};
use crate::lifecycle::Lifecycle;
use crate::services::ServiceLocator;

struct PoolEntry<T: Component> {
    pool: Rc<RefCell<ComponentPool<T>>>,
    /// Unsubscribes when the entry is dropped.
    _on_destroyed: Receiver<EntityDestroyed>,
}

/// Type-indexed collection of component pools.
///
/// Pools are registered once at startup through `&mut self`. After that every
/// operation takes `&self`, so the registry can be shared through an [`Rc`]
/// and used from inside event callbacks.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use keystone_core::{ComponentRegistry, EntityRegistry, EventHub, Lifecycle, ServiceLocator};
///
/// #[derive(Default)]
/// struct Health { current: i32 }
///
/// let mut services = ServiceLocator::new();
/// services.set(Rc::new(EventHub::new()));
///
/// let mut entities = EntityRegistry::new();
/// entities.initialize(&services).unwrap();
/// let entities = Rc::new(entities);
/// services.set(Rc::clone(&entities));
///
/// let mut components = ComponentRegistry::new();
/// components.initialize(&services).unwrap();
/// components.register_pool::<Health>().unwrap();
///
/// let player = entities.create_entity();
/// components.create::<Health>(player).unwrap().current = 100;
/// assert_eq!(components.lookup::<Health>(player).unwrap().current, 100);
///
/// entities.destroy_entity(player);
/// entities.process_commands();
/// assert!(components.lookup::<Health>(player).is_none());
/// ```
pub struct ComponentRegistry {
    pools: HashMap<TypeId, Box<dyn Any>>,
    entities: Option<Rc<EntityRegistry>>,
    events: Option<Rc<EventHub>>,
    config: ComponentConfig,
}

impl ComponentRegistry {
    /// Creates an uninitialized registry with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ComponentConfig::default())
    }

    /// Creates an uninitialized registry.
    #[must_use]
    pub fn with_config(config: ComponentConfig) -> Self {
        Self {
            pools: HashMap::new(),
            entities: None,
            events: None,
            config,
        }
    }

    /// Creates the pool for `T` and subscribes it to [`EntityDestroyed`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingService`] if the registry has not been
    /// initialized.
    ///
    /// # Panics
    ///
    /// Panics if a pool for `T` is already registered.
    pub fn register_pool<T: Component>(&mut self) -> CoreResult<()> {
        let events = self
            .events
            .as_ref()
            .ok_or_else(CoreError::missing::<EventHub>)?;
        assert!(
            !self.pools.contains_key(&TypeId::of::<T>()),
            "component pool for {} registered twice",
            std::any::type_name::<T>()
        );

        let pool = Rc::new(RefCell::new(ComponentPool::<T>::new(self.config.page_size)));
        let weak = Rc::downgrade(&pool);
        let mut on_destroyed = Receiver::bind(move |event: &EntityDestroyed| {
            let Some(pool) = weak.upgrade() else {
                return;
            };
            let Ok(mut pool) = pool.try_borrow_mut() else {
                panic!(
                    "component pool for {} still borrowed while entity {} was destroyed",
                    std::any::type_name::<T>(),
                    event.handle
                );
            };
            if pool.remove(event.handle).is_some() {
                tracing::trace!(
                    handle = %event.handle,
                    component = std::any::type_name::<T>(),
                    "component removed with entity"
                );
            }
        });
        events.subscribe(&mut on_destroyed);

        self.pools.insert(
            TypeId::of::<T>(),
            Box::new(PoolEntry {
                pool,
                _on_destroyed: on_destroyed,
            }),
        );
        tracing::debug!(component = std::any::type_name::<T>(), "component pool registered");
        Ok(())
    }

    /// Returns `true` if a pool for `T` is registered.
    #[must_use]
    pub fn is_registered<T: Component>(&self) -> bool {
        self.pools.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered pools.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Attaches a default-constructed `T` to `handle`.
    ///
    /// Returns `None` without touching the pool if `handle` is not a valid
    /// entity, already has a `T`, or no pool for `T` is registered.
    pub fn create<T: Component>(&self, handle: Handle) -> Option<RefMut<'_, T>> {
        let entities = self.entities.as_ref()?;
        if !entities.is_handle_valid(handle) {
            tracing::debug!(%handle, component = std::any::type_name::<T>(), "create on invalid entity");
            return None;
        }
        let entry = self.entry::<T>()?;
        RefMut::filter_map(entry.pool.borrow_mut(), |pool| pool.create(handle)).ok()
    }

    /// Gets the `T` attached to `handle`.
    #[must_use]
    pub fn lookup<T: Component>(&self, handle: Handle) -> Option<Ref<'_, T>> {
        let entry = self.entry::<T>()?;
        Ref::filter_map(entry.pool.borrow(), |pool| pool.lookup(handle)).ok()
    }

    /// Gets the `T` attached to `handle` mutably.
    #[must_use]
    pub fn lookup_mut<T: Component>(&self, handle: Handle) -> Option<RefMut<'_, T>> {
        let entry = self.entry::<T>()?;
        RefMut::filter_map(entry.pool.borrow_mut(), |pool| pool.lookup_mut(handle)).ok()
    }

    /// Gets the `T` attached to `handle` mutably without panicking on a
    /// borrowed pool.
    ///
    /// Meant for event handlers that may run while the pool is being
    /// iterated.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PoolBusy`] if a guard on the pool for `T` is alive.
    pub fn try_lookup_mut<T: Component>(
        &self,
        handle: Handle,
    ) -> CoreResult<Option<RefMut<'_, T>>> {
        let Some(entry) = self.entry::<T>() else {
            return Ok(None);
        };
        let pool = entry
            .pool
            .try_borrow_mut()
            .map_err(|_| CoreError::PoolBusy(std::any::type_name::<T>()))?;
        Ok(RefMut::filter_map(pool, |pool| pool.lookup_mut(handle)).ok())
    }

    /// Detaches the `T` from `handle`. No-op if there is none.
    pub fn remove<T: Component>(&self, handle: Handle) -> Option<T> {
        self.entry::<T>()?.pool.borrow_mut().remove(handle)
    }

    /// Borrows the whole pool for `T`, e.g. to iterate it.
    ///
    /// Events may be dispatched while the guard is alive, but the mutable
    /// paths for `T` ([`ComponentRegistry::create`],
    /// [`ComponentRegistry::lookup_mut`], [`ComponentRegistry::remove`] and
    /// [`ComponentRegistry::pool_mut`]) panic until it is dropped. Handlers
    /// that can run during such an iteration use
    /// [`ComponentRegistry::try_lookup_mut`].
    #[must_use]
    pub fn pool<T: Component>(&self) -> Option<Ref<'_, ComponentPool<T>>> {
        Some(self.entry::<T>()?.pool.borrow())
    }

    /// Borrows the whole pool for `T` mutably.
    ///
    /// Every other access to the pool for `T` panics while the guard is alive.
    #[must_use]
    pub fn pool_mut<T: Component>(&self) -> Option<RefMut<'_, ComponentPool<T>>> {
        Some(self.entry::<T>()?.pool.borrow_mut())
    }

    fn entry<T: Component>(&self) -> Option<&PoolEntry<T>> {
        self.pools
            .get(&TypeId::of::<T>())?
            .downcast_ref::<PoolEntry<T>>()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle for ComponentRegistry {
    fn initialize(&mut self, services: &ServiceLocator) -> CoreResult<()> {
        self.cleanup();

        if self.config.page_size == 0 {
            return Err(CoreError::InvalidConfig(
                "components.page_size must be greater than zero".into(),
            ));
        }
        let events = services.get::<EventHub>().ok_or_else(CoreError::missing::<EventHub>)?;
        let entities = services
            .get::<EntityRegistry>()
            .ok_or_else(CoreError::missing::<EntityRegistry>)?;

        self.events = Some(events);
        self.entities = Some(entities);
        tracing::info!(page_size = self.config.page_size, "component registry initialized");
        Ok(())
    }

    fn cleanup(&mut self) {
        // Dropping the entries unsubscribes their destroy receivers.
        self.pools.clear();
        self.entities = None;
        self.events = None;
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("pools", &self.pool_count())
            .field("initialized", &self.entities.is_some())
            .finish()
    }
}
