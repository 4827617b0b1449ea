//! Payload-less change notification.
//!
//! Observers subscribe to a channel and treat any message as "something
//! changed, re-read what you need". The owner raises at most once per tick;
//! engines never hold references to their observers.

use std::cell::RefCell;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Broadcast signal with any number of listeners.
#[derive(Default)]
pub struct ChangeSignal {
    senders: RefCell<Vec<Sender<()>>>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> Receiver<()> {
        let (tx, rx) = channel();
        self.senders.borrow_mut().push(tx);
        rx
    }

    /// Notify all live listeners, dropping any that have disconnected.
    pub fn raise(&self) {
        self.senders
            .borrow_mut()
            .retain(|tx| tx.send(()).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.senders.borrow().len()
    }
}
