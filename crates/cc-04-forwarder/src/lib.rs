//! # CC-04 Forwarder
//!
//! Outbound half of cross-chain delivery.
//!
//! **Subsystem ID:** 04
//! **Architecture:** Hexagonal (domain + ports + adapters + service)
//!
//! ## Identity rules
//!
//! | Operation | Envelope id | Transaction id |
//! |-----------|-------------|----------------|
//! | `forward_message` | new | new |
//! | `retry_envelope` | same | new |
//! | `retry_transaction` | same | same |
//!
//! Every adapter attempt is published as `TransactionForwardingAttempted`,
//! whether or not it succeeded.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{ForwardedCall, MockBridgeAdapter};
pub use domain::{AdapterAttempt, AdapterResult, ForwardReceipt, ForwarderError};
pub use ports::{AdapterBook, BridgeAdapter};
pub use service::Forwarder;
