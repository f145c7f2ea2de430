//! # Domain Entities
//!
//! Values extracted from proofs.

use primitive_types::U256;
use shared_types::Hash;

/// Maximum nodes walked in one proof.
pub const MAX_PROOF_DEPTH: usize = 64;

/// Index of the state root in an Ethereum block header.
pub const HEADER_STATE_ROOT_INDEX: usize = 3;

/// keccak256(rlp("")), the root of an empty trie.
pub const EMPTY_TRIE_ROOT: Hash = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
    0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
    0xb4, 0x21,
];

/// Account leaf of the state trie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountState {
    /// Transaction count
    pub nonce: u64,
    /// Wei balance
    pub balance: U256,
    /// Root of the account's storage trie
    pub storage_root: Hash,
    /// keccak256 of the account code
    pub code_hash: Hash,
}

/// Result of a storage read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageSlot {
    /// False when the proof shows absence or could not be verified.
    pub exists: bool,
    /// Raw slot value, zero when absent.
    pub value: U256,
}

impl StorageSlot {
    /// A present slot.
    pub fn found(value: U256) -> Self {
        Self {
            exists: true,
            value,
        }
    }

    /// An absent slot.
    pub fn absent() -> Self {
        Self::default()
    }
}
