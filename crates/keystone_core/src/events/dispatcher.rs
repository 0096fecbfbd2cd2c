//! # Dispatcher
//!
//! The subscriber list for one event type.
//!
//! ```text
//!   slots:   [ A ][ - ][ C ][ B ]      arena, indexed by SubscriptionId
//!   order:   head -> A -> B -> C -> None   (subscription order)
//! ```
//!
//! Nodes live in an arena and are linked by index, so a subscription is
//! named by a generational id instead of a pointer. A stale id (its slot was
//! unlinked and reused) can never unlink somebody else's subscription.

use std::cell::RefCell;
use std::rc::Rc;

use super::receiver::Receiver;

/// Callback target bound to a receiver.
pub(crate) type Callback<E> = Rc<dyn Fn(&E)>;

/// Names one link in a [`Dispatcher`] list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    index: u32,
    generation: u32,
}

struct Node<E: 'static> {
    generation: u32,
    next: Option<u32>,
    callback: Option<Callback<E>>,
}

/// Arena-backed singly linked list of callbacks.
struct Links<E: 'static> {
    nodes: Vec<Node<E>>,
    head: Option<u32>,
    tail: Option<u32>,
    vacant: Vec<u32>,
    len: usize,
}

impl<E: 'static> Links<E> {
    const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            tail: None,
            vacant: Vec::new(),
            len: 0,
        }
    }

    fn node(&self, id: SubscriptionId) -> Option<&Node<E>> {
        self.nodes
            .get(id.index as usize)
            .filter(|node| node.generation == id.generation && node.callback.is_some())
    }

    /// O(1): appends at the tail.
    fn push_back(&mut self, callback: Callback<E>) -> SubscriptionId {
        let index = match self.vacant.pop() {
            Some(index) => {
                let node = &mut self.nodes[index as usize];
                node.next = None;
                node.callback = Some(callback);
                index
            }
            None => {
                assert!(
                    self.nodes.len() < u32::MAX as usize,
                    "subscription arena exceeded u32::MAX entries"
                );
                let index = self.nodes.len() as u32;
                self.nodes.push(Node {
                    generation: 0,
                    next: None,
                    callback: Some(callback),
                });
                index
            }
        };

        match self.tail {
            Some(tail) => self.nodes[tail as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        SubscriptionId {
            index,
            generation: self.nodes[index as usize].generation,
        }
    }

    /// O(n): walks from the head to find the predecessor.
    fn unlink(&mut self, id: SubscriptionId) -> bool {
        if self.node(id).is_none() {
            return false;
        }

        let mut previous: Option<u32> = None;
        let mut cursor = self.head;
        while let Some(current) = cursor {
            if current == id.index {
                let next = self.nodes[current as usize].next;
                match previous {
                    Some(prev) => self.nodes[prev as usize].next = next,
                    None => self.head = next,
                }
                if self.tail == Some(current) {
                    self.tail = previous;
                }

                let node = &mut self.nodes[current as usize];
                node.callback = None;
                node.next = None;
                node.generation = node.generation.wrapping_add(1);
                self.vacant.push(current);
                self.len -= 1;
                return true;
            }
            previous = cursor;
            cursor = self.nodes[current as usize].next;
        }

        false
    }

    fn callbacks(&self) -> Vec<Callback<E>> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(current) = cursor {
            let node = &self.nodes[current as usize];
            if let Some(callback) = &node.callback {
                out.push(Rc::clone(callback));
            }
            cursor = node.next;
        }
        out
    }
}

/// Ordered list of receivers for events of type `E`.
///
/// Usually reached through [`EventHub`](super::EventHub), which creates one
/// dispatcher per event type on first use. A dispatcher can also be used on
/// its own; it must live in an [`Rc`] so receivers can refer back to it
/// weakly.
///
/// # Re-entrancy
///
/// [`Dispatcher::dispatch`] snapshots the list before invoking anything.
/// Subscribing or unsubscribing receivers of the same event type from inside
/// a callback is memory-safe, but a receiver unsubscribed mid-dispatch may
/// still see the event in flight. Avoid doing it.
pub struct Dispatcher<E: 'static> {
    links: RefCell<Links<E>>,
}

impl<E: 'static> Dispatcher<E> {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            links: RefCell::new(Links::new()),
        })
    }

    /// Links `receiver` at the end of this dispatcher's list.
    ///
    /// A receiver already subscribed (here or to another dispatcher) is
    /// unsubscribed first. Returns `false` and leaves the receiver untouched
    /// if it has no bound target.
    pub fn subscribe(self: &Rc<Self>, receiver: &mut Receiver<E>) -> bool {
        receiver.attach(self)
    }

    /// Unlinks `receiver` if it is subscribed to this dispatcher.
    ///
    /// No-op otherwise.
    pub fn unsubscribe(self: &Rc<Self>, receiver: &mut Receiver<E>) {
        if receiver.is_subscribed_to(self) {
            receiver.unsubscribe();
        }
    }

    /// Invokes every subscribed callback with `event`, in subscription order.
    ///
    /// Returns the number of callbacks invoked.
    pub fn dispatch(&self, event: &E) -> usize {
        let callbacks = self.links.borrow().callbacks();
        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }

    /// Returns the number of subscribed receivers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.borrow().len
    }

    /// Returns `true` if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn link(&self, callback: Callback<E>) -> SubscriptionId {
        self.links.borrow_mut().push_back(callback)
    }

    pub(crate) fn unlink(&self, id: SubscriptionId) -> bool {
        self.links.borrow_mut().unlink(id)
    }

    /// Swaps the callback of a live subscription in place, keeping its position.
    pub(crate) fn rebind(&self, id: SubscriptionId, callback: Callback<E>) -> bool {
        let mut links = self.links.borrow_mut();
        if links.node(id).is_none() {
            return false;
        }
        links.nodes[id.index as usize].callback = Some(callback);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Callback<u32> {
        let log = Rc::clone(log);
        Rc::new(move |_: &u32| log.borrow_mut().push(name))
    }

    #[test]
    fn test_dispatch_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let dispatcher = Dispatcher::<u32>::new();
        dispatcher.link(recorder(&log, "a"));
        dispatcher.link(recorder(&log, "b"));
        dispatcher.link(recorder(&log, "c"));

        assert_eq!(dispatcher.dispatch(&1), 3);
        assert_eq!(*log.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn test_unlink_head_middle_tail() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let dispatcher = Dispatcher::<u32>::new();
        let a = dispatcher.link(recorder(&log, "a"));
        let b = dispatcher.link(recorder(&log, "b"));
        let c = dispatcher.link(recorder(&log, "c"));
        let d = dispatcher.link(recorder(&log, "d"));

        assert!(dispatcher.unlink(b));
        assert!(dispatcher.unlink(a));
        assert!(dispatcher.unlink(d));
        assert_eq!(dispatcher.len(), 1);

        dispatcher.dispatch(&0);
        assert_eq!(*log.borrow(), ["c"]);

        // Tail was fixed up: new links go after "c".
        dispatcher.link(recorder(&log, "e"));
        log.borrow_mut().clear();
        dispatcher.dispatch(&0);
        assert_eq!(*log.borrow(), ["c", "e"]);
        assert!(dispatcher.unlink(c));
    }

    #[test]
    fn test_stale_id_cannot_unlink_reused_slot() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let dispatcher = Dispatcher::<u32>::new();
        let old = dispatcher.link(recorder(&log, "old"));
        assert!(dispatcher.unlink(old));

        let new = dispatcher.link(recorder(&log, "new"));
        assert_eq!(old.index, new.index);
        assert_ne!(old, new);

        assert!(!dispatcher.unlink(old));
        assert_eq!(dispatcher.len(), 1);
    }

    #[test]
    fn test_empty_dispatch() {
        let dispatcher = Dispatcher::<u32>::new();
        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.dispatch(&5), 0);
    }
}
