//! # Domain Errors

use cc_01_envelope_codec::CodecError;
use cc_03_adapter_registry::RegistryError;
use shared_types::{to_hex, Address, ChainId, Hash};
use thiserror::Error;

/// Receiver errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiverError {
    /// The calling adapter is not allowed for the origin chain.
    #[error("Adapter {} is not allowed for chain {chain_id}", to_hex(.adapter))]
    AdapterNotAllowed {
        /// Calling adapter
        adapter: Address,
        /// Claimed origin chain
        chain_id: ChainId,
    },

    /// Envelope chain ids disagree with the delivery route.
    #[error("Chain id mismatch: envelope {envelope_origin}->{envelope_destination}, route {origin_chain_id}->{local_chain_id}")]
    ChainIdMismatch {
        /// Envelope origin chain
        envelope_origin: ChainId,
        /// Envelope destination chain
        envelope_destination: ChainId,
        /// Origin chain reported by the adapter
        origin_chain_id: ChainId,
        /// This chain
        local_chain_id: ChainId,
    },

    /// `deliver_envelope` on an envelope that never reached its threshold.
    #[error("Envelope {} is not confirmed", to_hex(.0))]
    EnvelopeNotConfirmed(Hash),

    /// Malformed transaction or envelope bytes.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Registry rejected a configuration change.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Destination handler refused a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Build from any displayable reason.
    pub fn new(reason: impl ToString) -> Self {
        Self(reason.to_string())
    }
}
