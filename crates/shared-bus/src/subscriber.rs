//! # Event Subscriber
//!
//! Receiving side of the bus for relayers and monitors.

use crate::events::{EventFilter, ProtocolEvent};
use thiserror::Error;
use tokio::sync::broadcast;

/// Subscription errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("event bus closed")]
    Closed,

    /// The subscriber fell behind and missed events.
    #[error("subscriber lagged by {0} events")]
    Lagged(u64),
}

/// A filtered handle on the broadcast channel.
pub struct Subscription {
    receiver: broadcast::Receiver<ProtocolEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<ProtocolEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Wait for the next event matching the filter.
    pub async fn recv(&mut self) -> Result<ProtocolEvent, SubscriptionError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(SubscriptionError::Closed),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    return Err(SubscriptionError::Lagged(n))
                }
            }
        }
    }

    /// Next already-buffered matching event, without waiting.
    pub fn try_recv(&mut self) -> Option<ProtocolEvent> {
        while let Ok(event) = self.receiver.try_recv() {
            if self.filter.matches(&event) {
                return Some(event);
            }
        }
        None
    }
}
