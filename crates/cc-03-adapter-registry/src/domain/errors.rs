//! # Domain Errors
//!
//! Error types for registry configuration.

use shared_types::{AccessError, ChainId, Timestamp};
use thiserror::Error;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Caller lacks the required role.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Zero address given as a bridge adapter.
    #[error("Invalid bridge adapter")]
    InvalidAdapter,

    /// Threshold is zero or larger than the allowed receiver adapters.
    #[error("Invalid required confirmations {requested} for chain {chain_id} ({allowed} adapters allowed)")]
    InvalidConfirmationCount {
        /// Origin chain
        chain_id: ChainId,
        /// Requested threshold
        requested: u8,
        /// Allowed receiver adapters for the chain
        allowed: usize,
    },

    /// Invalidation watermark after the current time.
    #[error("Validity timestamp {timestamp} for chain {chain_id} is in the future (now {now})")]
    FutureTimestamp {
        /// Origin chain
        chain_id: ChainId,
        /// Requested watermark
        timestamp: Timestamp,
        /// Current time
        now: Timestamp,
    },

    /// The same chain appears twice in one emergency update.
    #[error("Only one emergency update per chain (chain {0} repeated)")]
    OnlyOneEmergencyUpdatePerChain(ChainId),
}
