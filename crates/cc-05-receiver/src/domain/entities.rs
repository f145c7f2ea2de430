//! # Domain Entities
//!
//! Per-transaction confirmation bookkeeping and per-envelope delivery state.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, Timestamp};

/// Delivery state of an envelope. Only ever moves forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnvelopeState {
    /// Not yet confirmed by enough adapters.
    #[default]
    None,
    /// Threshold reached; delivery pending or failed.
    Confirmed,
    /// Destination accepted the payload.
    Delivered,
}

/// Confirmation count and first arrival of a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
    /// Distinct adapters that confirmed.
    pub confirmations: u8,
    /// Time of the first confirmation, zero when never seen.
    pub first_bridged_at: Timestamp,
}

/// Result of one delivery attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    /// The destination accepted the payload.
    Delivered,
    /// The destination rejected it; the envelope stays `Confirmed`.
    Failed(String),
    /// Delivered earlier; nothing was called.
    AlreadyDelivered,
}

impl DeliveryOutcome {
    /// True for `Delivered` and `AlreadyDelivered`.
    pub fn is_delivered(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// What `receive_message` did with a confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiveStatus {
    /// This adapter had already confirmed the transaction.
    AlreadyReceived,
    /// The transaction was first bridged at or before the watermark.
    Invalidated,
    /// Confirmation counted, no delivery triggered.
    Recorded,
    /// Confirmation counted and it promoted the envelope.
    DeliveryAttempted(DeliveryOutcome),
}

/// Report returned by `receive_message`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveReport {
    /// Transaction id.
    pub transaction_id: Hash,
    /// Wrapped envelope id.
    pub envelope_id: Hash,
    /// Confirmations after this call.
    pub confirmations: u8,
    /// What happened.
    pub status: ReceiveStatus,
}
