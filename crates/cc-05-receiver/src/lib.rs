//! # CC-05 Receiver
//!
//! Inbound half of cross-chain delivery.
//!
//! **Subsystem ID:** 05
//! **Architecture:** Hexagonal (domain + ports + adapters + service)
//!
//! ## Envelope lifecycle
//!
//! ```text
//! None ──threshold met, bridged after watermark──▶ Confirmed ──handler ok──▶ Delivered
//!                                                     ▲    │
//!                                                     └────┘ handler failed
//!                                                  (deliver_envelope retries)
//! ```
//!
//! A transaction's confirmations are counted per distinct adapter, so the
//! outcome depends only on which adapters confirmed, never on their order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{ReceivedMessage, RecordingHandler};
pub use domain::{
    DeliveryOutcome, EnvelopeState, HandlerError, ReceiveReport, ReceiveStatus, ReceiverError,
    TransactionState,
};
pub use ports::{DestinationHandler, HandlerBook};
pub use service::Receiver;
