//! Fill event delivery.
//!
//! Completed fills are pushed to every subscriber. Each subscriber gets its own
//! channel; one that has hung up is dropped on the next publish rather than
//! failing the fill.

use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::sim::records::FillEvent;

/// Receiver of completed fills.
pub trait FillSink: Send + Sync {
    /// Called once per completed fill, in completion order.
    fn deliver(&self, event: &FillEvent);
}

/// Fan-out of fill events to channel subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<FillEvent>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its end of the channel.
    pub fn subscribe(&self) -> Receiver<FillEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Number of live subscribers as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Sends `event` to every subscriber and returns how many received it.
    pub fn publish(&self, event: &FillEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }
}

impl FillSink for EventBus {
    fn deliver(&self, event: &FillEvent) {
        let delivered = self.publish(event);
        tracing::trace!(ticket = event.ticket, delivered, "fill event published");
    }
}
