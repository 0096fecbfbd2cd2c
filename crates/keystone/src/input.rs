//! # Input Queue
//!
//! Bounded channel between input producers and the tick thread.
//!
//! ```text
//! producer ──try_send──> [ bounded channel ] ──drain──> TickDriver (once per tick)
//! ```
//!
//! Producers may live on any thread; only plain data crosses the channel.
//! Everything that touches the core happens on the tick thread.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use keystone_core::Handle;

/// A request applied at the start of the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCommand {
    /// Spawn an entity with full health.
    Spawn,
    /// Deal damage to an entity.
    Attack {
        /// Entity hit.
        target: Handle,
        /// Damage dealt.
        value: i32,
    },
    /// Remove an entity outright.
    Despawn {
        /// Entity removed.
        target: Handle,
    },
}

/// Handle for sending input. Clone it for every producer.
#[derive(Clone, Debug)]
pub struct InputSender {
    sender: Sender<InputCommand>,
}

impl InputSender {
    /// Queues a command without blocking.
    ///
    /// Returns `false` if the queue is full or the driver is gone; the
    /// command is dropped.
    #[inline]
    pub fn send(&self, command: InputCommand) -> bool {
        match self.sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(?command, "input queue full, command dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Queues a command, waiting for room if the queue is full.
    ///
    /// Returns `false` if the driver is gone.
    #[inline]
    pub fn send_blocking(&self, command: InputCommand) -> bool {
        self.sender.send(command).is_ok()
    }
}

/// Receiving end, owned by the tick driver.
#[derive(Debug)]
pub(crate) struct InputQueue {
    sender: Sender<InputCommand>,
    receiver: Receiver<InputCommand>,
}

impl InputQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    pub(crate) fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Takes at most what was queued when the call started, so a producer
    /// that keeps up cannot starve the rest of the tick.
    pub(crate) fn drain(&self) -> impl Iterator<Item = InputCommand> + '_ {
        let pending = self.pending();
        self.receiver.try_iter().take(pending)
    }

    pub(crate) fn pending(&self) -> usize {
        self.receiver.len()
    }
}
