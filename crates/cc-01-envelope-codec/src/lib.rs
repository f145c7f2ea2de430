//! # CC-01 Envelope Codec
//!
//! Canonical encoding and content-derived identifiers for cross-chain
//! envelopes, transactions and governance messages.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Hexagonal (domain + algorithms)
//!
//! ## Encoding
//!
//! All structures use Ethereum ABI encoding (32-byte words, offset-prefixed
//! dynamic members) so that ids match what EVM contracts compute:
//!
//! | Structure | ABI type | Id |
//! |-----------|----------|----|
//! | Envelope | `((uint256,address,address,uint256,uint256,bytes))` | keccak256 |
//! | Transaction | `((uint256,bytes))` | keccak256 |
//! | Governance message | `(uint8,bytes)` | n/a |
//!
//! The message-type tag is part of every governance message, so a proposal
//! and a vote with identical fields never share an encoding.
//!
//! ## Module Structure
//!
//! ```text
//! cc-01-envelope-codec/
//! ├── domain/          # Envelope, Transaction, governance messages, errors
//! └── algorithms/      # ABI word codec, keccak256
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;

// Re-exports
pub use algorithms::{decode, encode, keccak256, ParamType, Token};
pub use domain::{
    decode_governance_message, encode_governance_message, CodecError, EncodedEnvelope,
    EncodedTransaction, Envelope, MessageType, PayloadExecutionMessage, ProposalMessage,
    ProposalResultMessage, Transaction, VoteMessage, VotingAssetWithSlot,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
