//! # Domain Errors
//!
//! Error types for the forwarder.

use cc_01_envelope_codec::CodecError;
use shared_types::{to_hex, AccessError, Address, ChainId, Hash};
use thiserror::Error;

/// Forwarder errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwarderError {
    /// Caller lacks the required role.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Caller is not an approved sender.
    #[error("Sender {} is not approved", to_hex(.0))]
    SenderNotApproved(Address),

    /// No usable forwarder adapter for the destination chain.
    #[error("No bridge adapters for chain {0}")]
    NoBridgeAdaptersForChain(ChainId),

    /// Retry of an envelope this forwarder never registered.
    #[error("Envelope {} is not registered", to_hex(.0))]
    EnvelopeNotRegistered(Hash),

    /// Retry of a transaction this forwarder never sent.
    #[error("Transaction {} was not forwarded", to_hex(.0))]
    TransactionNotForwarded(Hash),

    /// The same adapter listed twice in a retry.
    #[error("Adapter {} listed more than once", to_hex(.0))]
    DuplicateAdapterInList(Address),

    /// Transaction bytes could not be decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}
