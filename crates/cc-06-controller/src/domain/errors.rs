//! # Domain Errors
//!
//! Inner subsystem errors are wrapped unchanged so callers can still match
//! on the original reason.

use cc_03_adapter_registry::RegistryError;
use cc_04_forwarder::ForwarderError;
use cc_05_receiver::ReceiverError;
use shared_types::{AccessError, ChainId};
use thiserror::Error;

/// Controller errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// Caller lacks the required role.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Registry rejected the change.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Forwarding failed.
    #[error(transparent)]
    Forwarder(#[from] ForwarderError),

    /// Receiving or delivery failed.
    #[error(transparent)]
    Receiver(#[from] ReceiverError),

    /// Zero address given as the emergency oracle.
    #[error("Invalid emergency oracle")]
    InvalidEmergencyOracle,

    /// The oracle reports no emergency newer than the last one solved.
    #[error("Not in emergency (oracle count {oracle_count}, solved {local_count})")]
    NotInEmergency {
        /// Count reported by the oracle
        oracle_count: u64,
        /// Count already solved locally
        local_count: u64,
    },

    /// Configured chain id differs from the chain context.
    #[error("Configured chain {configured} does not match context chain {context}")]
    ChainIdMismatch {
        /// From `ControllerConfig`
        configured: ChainId,
        /// From the chain context
        context: ChainId,
    },
}
