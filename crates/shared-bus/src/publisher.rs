//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{EventFilter, ProtocolEvent};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Trait for publishing protocol events.
///
/// Services hold an `Arc<dyn EventPublisher>` and publish every event they
/// emit, in emission order, before the call returns.
pub trait EventPublisher: Send + Sync {
    /// Publish an event.
    fn publish(&self, event: ProtocolEvent);

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory event bus.
///
/// Keeps the full history and fans events out to live subscribers over
/// `tokio::sync::broadcast`.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<ProtocolEvent>,

    /// Every event published so far.
    history: RwLock<Vec<ProtocolEvent>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            history: RwLock::new(Vec::new()),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to future events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Snapshot of every event published so far.
    #[must_use]
    pub fn history(&self) -> Vec<ProtocolEvent> {
        self.history.read().clone()
    }

    /// Events published so far that match `filter`.
    #[must_use]
    pub fn history_matching(&self, filter: &EventFilter) -> Vec<ProtocolEvent> {
        self.history
            .read()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    /// Remove and return the history. Useful to inspect one call at a time.
    pub fn drain(&self) -> Vec<ProtocolEvent> {
        std::mem::take(&mut *self.history.write())
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: ProtocolEvent) {
        debug!(event = event.name(), topic = ?event.topic(), "Publishing event");
        self.history.write().push(event.clone());
        self.events_published.fetch_add(1, Ordering::Relaxed);
        // No subscribers is fine; the history still records the event.
        let _ = self.sender.send(event);
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

/// Publisher that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: ProtocolEvent) {}

    fn events_published(&self) -> u64 {
        0
    }
}
