//! # Shared Bus - Protocol Event Log
//!
//! Every observable effect of the cross-chain protocol (adapter attempts,
//! confirmations, delivery attempts, governance transitions) is published as
//! a [`ProtocolEvent`]. Tolerated partial failures are only visible here, so
//! relayers and monitors subscribe to the bus to decide on retries.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe()  ┌──────────┐
//! │  Forwarder   │ ────────────▶ │  Event Bus   │ ────────────▶ │ Relayer  │
//! │  Receiver    │               │  (history +  │               │ Monitor  │
//! │  Governance  │               │  broadcast)  │               │ Tests    │
//! └──────────────┘               └──────────────┘               └──────────┘
//! ```
//!
//! Publishing is synchronous: each protocol call runs to completion and its
//! events are appended in emission order before it returns.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, ProtocolEvent};
pub use publisher::{EventPublisher, InMemoryEventBus, NoopPublisher};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
