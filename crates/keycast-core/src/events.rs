use crate::types::RawKey;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::time::Instant;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

/// Raw edge as captured, stamped on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: RawKey,
    pub edge: KeyEdge,
    pub t: Instant,
}

impl KeyEvent {
    pub fn down(key: RawKey, t: Instant) -> Self {
        Self {
            key,
            edge: KeyEdge::Down,
            t,
        }
    }

    pub fn up(key: RawKey, t: Instant) -> Self {
        Self {
            key,
            edge: KeyEdge::Up,
            t,
        }
    }
}

/// Sending half handed to capture callbacks. Never blocks.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<KeyEvent>,
}

impl EventSink {
    pub fn press(&self, key: RawKey) -> bool {
        self.send(KeyEvent::down(key, Instant::now()))
    }

    pub fn release(&self, key: RawKey) -> bool {
        self.send(KeyEvent::up(key, Instant::now()))
    }

    /// Queues `event`. Returns false when it was dropped because the queue is
    /// full or the render loop is gone.
    pub fn send(&self, event: KeyEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(ev)) => {
                warn!("Event queue full, dropping {:?} {}", ev.edge, ev.key);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Bounded queue between the capture thread and the render loop.
pub fn event_channel(capacity: usize) -> (EventSink, Receiver<KeyEvent>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (EventSink { tx }, rx)
}
