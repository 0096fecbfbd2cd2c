//! A type-safe service locator for wiring systems together at startup.
//!
//! The [`ServiceLocator`] is a type-map from a service's static type to a
//! shared [`Rc`] of it. Systems look up only the services they need during
//! [`Lifecycle::initialize`](crate::Lifecycle::initialize); nothing in the
//! core is global.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

/// Registry of shared services keyed by [`TypeId`].
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use keystone_core::{EventHub, ServiceLocator};
///
/// let mut services = ServiceLocator::new();
/// services.set(Rc::new(EventHub::new()));
///
/// assert!(services.get::<EventHub>().is_some());
/// ```
#[derive(Default)]
pub struct ServiceLocator {
    services: HashMap<TypeId, Rc<dyn Any>>,
}

impl ServiceLocator {
    /// Creates an empty locator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Registers `service` under `T`, replacing any previous `T`.
    pub fn set<T: 'static>(&mut self, service: Rc<T>) {
        tracing::debug!(service = std::any::type_name::<T>(), "service registered");
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Returns a shared reference to the `T` service, or `None`.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| Rc::clone(service).downcast::<T>().ok())
    }

    /// Removes and returns the `T` service.
    pub fn remove<T: 'static>(&mut self) -> Option<Rc<T>> {
        self.services
            .remove(&TypeId::of::<T>())
            .and_then(|service| service.downcast::<T>().ok())
    }

    /// Returns `true` if a `T` service is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.services.clear();
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("services", &self.services.len())
            .finish()
    }
}
