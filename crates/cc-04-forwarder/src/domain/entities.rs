//! # Domain Entities

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// What an adapter reports for one send.
///
/// A failed send is a value, not an error: fan-out tolerates partial failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterResult {
    /// Whether the adapter accepted the message.
    pub success: bool,
    /// Adapter-specific return data, or the failure reason.
    pub return_data: Vec<u8>,
}

impl AdapterResult {
    /// Successful send.
    pub fn ok(return_data: Vec<u8>) -> Self {
        Self {
            success: true,
            return_data,
        }
    }

    /// Failed send with a reason.
    pub fn failed(reason: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            return_data: reason.into(),
        }
    }
}

/// One adapter's attempt within a dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterAttempt {
    /// Adapter on this chain.
    pub bridge_adapter: Address,
    /// Adapter on the destination chain.
    pub destination_bridge_adapter: Address,
    /// Outcome.
    pub result: AdapterResult,
}

/// Result of `forward_message` and `retry_envelope`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardReceipt {
    /// Envelope id.
    pub envelope_id: Hash,
    /// Id of the transaction sent.
    pub transaction_id: Hash,
    /// Per-adapter outcomes, in registry order.
    pub attempts: Vec<AdapterAttempt>,
}

impl ForwardReceipt {
    /// Number of adapters that accepted the transaction.
    pub fn successful_attempts(&self) -> usize {
        self.attempts.iter().filter(|a| a.result.success).count()
    }
}
