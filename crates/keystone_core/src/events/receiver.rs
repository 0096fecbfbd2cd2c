//! # Receiver
//!
//! A receiver is a scoped subscription token: it owns the bound callback
//! target and remembers which dispatcher (if any) it is linked into. Dropping
//! it unlinks it, on every exit path including unwinding, so observers can be
//! destroyed at any time without leaving a dangling subscription behind.

use std::fmt;
use std::rc::{Rc, Weak};

use super::dispatcher::{Callback, Dispatcher, SubscriptionId};

struct Link<E: 'static> {
    dispatcher: Weak<Dispatcher<E>>,
    id: SubscriptionId,
}

/// Subscription handle for events of type `E`.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use keystone_core::{EventHub, Receiver};
///
/// struct Damaged { value: u32 }
///
/// let hub = EventHub::new();
/// let total = Rc::new(Cell::new(0));
/// let sink = Rc::clone(&total);
/// let mut receiver = Receiver::bind(move |e: &Damaged| sink.set(sink.get() + e.value));
///
/// hub.subscribe(&mut receiver);
/// hub.dispatch(Damaged { value: 10 });
/// drop(receiver);
/// hub.dispatch(Damaged { value: 10 });
/// assert_eq!(total.get(), 10);
/// ```
pub struct Receiver<E: 'static> {
    target: Option<Callback<E>>,
    link: Option<Link<E>>,
}

impl<E: 'static> Receiver<E> {
    /// Creates a receiver with no bound target.
    ///
    /// It cannot be subscribed until a target is set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            target: None,
            link: None,
        }
    }

    /// Creates a receiver bound to a closure or plain function.
    #[must_use]
    pub fn bind(target: impl Fn(&E) + 'static) -> Self {
        Self {
            target: Some(Rc::new(target)),
            link: None,
        }
    }

    /// Creates a receiver bound to a method of a shared instance.
    ///
    /// The instance is held weakly: once the last strong reference is gone the
    /// receiver silently ignores events, and no reference cycle can form when
    /// the instance owns its own receivers.
    #[must_use]
    pub fn bind_method<S: 'static>(instance: &Rc<S>, method: fn(&S, &E)) -> Self {
        let mut receiver = Self::new();
        receiver.set_method(instance, method);
        receiver
    }

    /// Replaces the bound target.
    ///
    /// A subscribed receiver keeps its position in the dispatch order.
    pub fn set_target(&mut self, target: impl Fn(&E) + 'static) {
        self.retarget(Rc::new(target));
    }

    /// Replaces the bound target with a weakly held `(instance, method)` pair.
    pub fn set_method<S: 'static>(&mut self, instance: &Rc<S>, method: fn(&S, &E)) {
        let instance = Rc::downgrade(instance);
        self.retarget(Rc::new(move |event: &E| {
            if let Some(instance) = instance.upgrade() {
                method(&instance, event);
            }
        }));
    }

    /// Returns `true` if a target is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    /// Returns `true` if linked into a dispatcher that is still alive.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| link.dispatcher.strong_count() > 0)
    }

    /// Returns the current subscription id, if subscribed.
    #[must_use]
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.link.as_ref().map(|link| link.id)
    }

    /// Unlinks this receiver from its dispatcher. No-op if not subscribed.
    pub fn unsubscribe(&mut self) {
        if let Some(link) = self.link.take() {
            if let Some(dispatcher) = link.dispatcher.upgrade() {
                dispatcher.unlink(link.id);
                tracing::trace!(event = std::any::type_name::<E>(), "receiver unsubscribed");
            }
        }
    }

    pub(crate) fn attach(&mut self, dispatcher: &Rc<Dispatcher<E>>) -> bool {
        let Some(target) = self.target.as_ref().map(Rc::clone) else {
            tracing::warn!(
                event = std::any::type_name::<E>(),
                "refusing to subscribe a receiver with no bound target"
            );
            return false;
        };

        self.unsubscribe();
        let id = dispatcher.link(target);
        self.link = Some(Link {
            dispatcher: Rc::downgrade(dispatcher),
            id,
        });
        tracing::trace!(event = std::any::type_name::<E>(), "receiver subscribed");
        true
    }

    pub(crate) fn is_subscribed_to(&self, dispatcher: &Rc<Dispatcher<E>>) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| std::ptr::eq(link.dispatcher.as_ptr(), Rc::as_ptr(dispatcher)))
    }

    fn retarget(&mut self, target: Callback<E>) {
        if let Some(link) = &self.link {
            if let Some(dispatcher) = link.dispatcher.upgrade() {
                dispatcher.rebind(link.id, Rc::clone(&target));
            }
        }
        self.target = Some(target);
    }
}

impl<E: 'static> Default for Receiver<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Drop for Receiver<E> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<E: 'static> fmt::Debug for Receiver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("event", &std::any::type_name::<E>())
            .field("bound", &self.is_bound())
            .field("subscription", &self.subscription_id())
            .finish()
    }
}
