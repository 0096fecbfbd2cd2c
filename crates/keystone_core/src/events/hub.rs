//! # Event Hub
//!
//! Type-indexed collection of dispatchers. One [`Dispatcher`] exists per
//! event type, created the first time anybody subscribes to or dispatches
//! that type.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::dispatcher::Dispatcher;
use super::receiver::Receiver;
use crate::error::CoreResult;
use crate::lifecycle::Lifecycle;
use crate::services::ServiceLocator;

/// Publish/subscribe bus keyed by event type.
///
/// The hub is shared through an [`Rc`] and used through `&self`, so systems
/// can subscribe, unsubscribe and dispatch from inside callbacks.
///
/// Event types need no registration and no trait: any `'static` type can be
/// dispatched. A dispatch with nobody subscribed is a no-op.
#[derive(Default)]
pub struct EventHub {
    dispatchers: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl EventHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dispatchers: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the dispatcher for `E`, creating it on first use.
    #[must_use]
    pub fn dispatcher<E: 'static>(&self) -> Rc<Dispatcher<E>> {
        if let Some(existing) = self.existing::<E>() {
            return existing;
        }

        let dispatcher = Dispatcher::<E>::new();
        let erased: Rc<dyn Any> = Rc::clone(&dispatcher) as Rc<dyn Any>;
        self.dispatchers
            .borrow_mut()
            .insert(TypeId::of::<E>(), erased);
        tracing::debug!(event = std::any::type_name::<E>(), "dispatcher created");
        dispatcher
    }

    /// Subscribes `receiver` to events of type `E`.
    ///
    /// Returns `false` if the receiver has no bound target.
    pub fn subscribe<E: 'static>(&self, receiver: &mut Receiver<E>) -> bool {
        self.dispatcher::<E>().subscribe(receiver)
    }

    /// Unsubscribes `receiver` from this hub. No-op if it is not subscribed here.
    pub fn unsubscribe<E: 'static>(&self, receiver: &mut Receiver<E>) {
        if let Some(dispatcher) = self.existing::<E>() {
            dispatcher.unsubscribe(receiver);
        }
    }

    /// Delivers `event` synchronously to every receiver of `E`, in
    /// subscription order.
    ///
    /// Returns the number of receivers invoked.
    pub fn dispatch<E: 'static>(&self, event: E) -> usize {
        match self.existing::<E>() {
            Some(dispatcher) => dispatcher.dispatch(&event),
            None => 0,
        }
    }

    /// Returns the number of receivers subscribed to `E`.
    #[must_use]
    pub fn receiver_count<E: 'static>(&self) -> usize {
        self.existing::<E>().map_or(0, |dispatcher| dispatcher.len())
    }

    /// Returns the number of event types that have a dispatcher.
    #[must_use]
    pub fn event_type_count(&self) -> usize {
        self.dispatchers.borrow().len()
    }

    /// Drops every dispatcher.
    ///
    /// Receivers still holding a subscription notice the dispatcher is gone
    /// and treat themselves as unsubscribed.
    pub fn clear(&self) {
        // Take the map out first so dispatcher drops never run under the borrow.
        let dispatchers = std::mem::take(&mut *self.dispatchers.borrow_mut());
        drop(dispatchers);
    }

    fn existing<E: 'static>(&self) -> Option<Rc<Dispatcher<E>>> {
        let erased = self.dispatchers.borrow().get(&TypeId::of::<E>()).cloned()?;
        erased.downcast::<Dispatcher<E>>().ok()
    }
}

impl Lifecycle for EventHub {
    fn initialize(&mut self, _services: &ServiceLocator) -> CoreResult<()> {
        self.cleanup();
        Ok(())
    }

    fn cleanup(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("event_types", &self.event_type_count())
            .finish()
    }
}
