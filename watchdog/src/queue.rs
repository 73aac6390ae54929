//! Pending-event queue between the notification thread and poll.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::event::RawChangeEvent;

/// Create a connected sink/queue pair.
pub fn channel() -> (EventSink, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, EventQueue { rx })
}

/// Producer side, held by the event filter.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<RawChangeEvent>,
}

impl EventSink {
    /// Append an event. Returns `false` once the queue has been dropped.
    pub fn push(&self, event: RawChangeEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer side, owned by the subscription.
#[derive(Debug)]
pub struct EventQueue {
    rx: UnboundedReceiver<RawChangeEvent>,
}

impl EventQueue {
    /// Take everything queued so far, oldest first. Never waits.
    pub fn drain(&mut self) -> Vec<RawChangeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
