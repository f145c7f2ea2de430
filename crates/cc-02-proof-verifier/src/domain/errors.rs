//! # Domain Errors
//!
//! Error types for block header and storage proof verification.

use shared_types::{Address, Hash};
use thiserror::Error;

/// Proof verification errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    /// keccak256(header) does not match the claimed block hash.
    #[error("Invalid block hash: claimed {claimed:?}, header hashes to {computed:?}")]
    InvalidBlockHash {
        /// Block hash supplied by the caller
        claimed: Hash,
        /// Hash of the supplied header
        computed: Hash,
    },

    /// Header is not an RLP list with a 32-byte state root at index 3.
    #[error("Invalid block header: {0}")]
    InvalidHeader(String),

    /// No storage root was processed for this account and block.
    #[error("Missing storage root for account {account:?} at block {block_hash:?}")]
    MissingStorageRoot {
        /// Account
        account: Address,
        /// Block hash
        block_hash: Hash,
    },

    /// Account proof proves absence.
    #[error("Account {0:?} does not exist in the state trie")]
    AccountDoesNotExist(Address),

    /// Proof has more nodes than allowed.
    #[error("Proof too deep: {depth} nodes (max {max})")]
    ProofTooDeep {
        /// Nodes supplied
        depth: usize,
        /// Limit
        max: usize,
    },

    /// Proof has no nodes but the root is not the empty trie.
    #[error("Empty proof for non-empty trie")]
    EmptyProof,

    /// The walk needs another node but the proof ended.
    #[error("Proof ended before reaching a leaf")]
    IncompleteProof,

    /// Nodes remain after the walk terminated.
    #[error("Proof has {0} unused trailing nodes")]
    TrailingNodes(usize),

    /// A node does not hash to the reference held by its parent.
    #[error("Node {index} does not match its parent reference")]
    NodeHashMismatch {
        /// Position in the proof
        index: usize,
    },

    /// A node is neither a branch (17 items) nor a leaf/extension (2 items).
    #[error("Invalid trie node: {0}")]
    InvalidNode(String),

    /// Account leaf is not `[nonce, balance, storageRoot, codeHash]`.
    #[error("Invalid account leaf: {0}")]
    InvalidAccount(String),

    /// Storage leaf is not an RLP integer of at most 32 bytes.
    #[error("Invalid storage value")]
    InvalidSlotValue,

    /// Low-level RLP failure.
    #[error("RLP decoding failed: {0}")]
    Rlp(#[from] rlp::DecoderError),
}
