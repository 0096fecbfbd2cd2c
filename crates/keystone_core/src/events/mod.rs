//! # Typed Events
//!
//! Synchronous publish/subscribe keyed by event type.
//!
//! - [`Dispatcher`] - ordered receiver list for one event type
//! - [`Receiver`] - scoped subscription; unsubscribes on drop
//! - [`EventHub`] - one dispatcher per event type, created on demand

mod dispatcher;
mod hub;
mod receiver;

pub use dispatcher::{Dispatcher, SubscriptionId};
pub use hub::EventHub;
pub use receiver::Receiver;
