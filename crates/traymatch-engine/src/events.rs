//! Fan-out of [`GameEvent`]s to presentation subscribers.

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;
use traymatch_core::GameEvent;

/// Multicast channel for game events.
///
/// Every subscriber gets its own unbounded receiver and sees every event
/// published after it subscribed, in publish order. Dropping a receiver
/// deregisters it: the bus prunes disconnected senders on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    senders: Vec<Sender<GameEvent>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.senders.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&mut self, event: GameEvent) {
        let before = self.senders.len();
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
        let dropped = before - self.senders.len();
        if dropped > 0 {
            debug!(dropped, "pruned disconnected event subscribers");
        }
    }

    /// Number of live subscribers as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}
