//! Published write events.
//!
//! A storage handle may carry an optional publish topic. Every write
//! operation casts an event tagged with the operation, the logical key and
//! value, and the transaction outcome. Delivery is best-effort: a topic with
//! no subscribers drops events silently.

use tokio::sync::broadcast;
use vellum_tables::TxOutcome;
use vellum_types::{Noun, StoredValue, Version};

/// An event published after a write or lifecycle operation.
#[derive(Debug, Clone)]
pub enum StorageEvent {
    /// A `put` (or `delete`, which puts a tombstone) ran.
    Put {
        /// Logical key, as the caller passed it.
        key: Noun,
        /// The stored value, tombstone included.
        value: StoredValue,
        /// Transaction outcome carrying the assigned version.
        outcome: TxOutcome<Version>,
    },

    /// A `write_at_order` ran, forcing a specific version.
    Write {
        /// Logical key, as the caller passed it.
        key: Noun,
        /// The stored value.
        value: StoredValue,
        /// The forced version.
        version: Version,
        /// Transaction outcome.
        outcome: TxOutcome<()>,
    },

    /// The qualified table was dropped.
    DeleteQualified(TxOutcome<()>),

    /// The order table was dropped.
    DeleteOrdering(TxOutcome<()>),

    /// The commitments table was dropped.
    DeleteCommitments(TxOutcome<()>),
}

/// A publish topic: an injected sink with one method.
#[derive(Debug, Clone)]
pub struct Topic {
    sender: broadcast::Sender<StorageEvent>,
}

impl Topic {
    /// Create a topic buffering up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Topic { sender }
    }

    /// Publish an event, best-effort.
    pub fn cast(&self, event: StorageEvent) {
        let _ = self.sender.send(event);
    }

    /// Listen for published events.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }
}
