//! # CC-02 Proof Verifier
//!
//! Validates Ethereum block headers and Merkle-Patricia account/storage
//! proofs, and keeps a registry of proven storage roots and slot values.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (domain + algorithms + ports + service)
//!
//! ## Flow
//!
//! ```text
//! header ──keccak256──▶ == blockHash? ──▶ stateRoot (item 3)
//!                                            │
//! accountProof ──walk(keccak256(account))────┘──▶ storageRoot  (stored)
//!                                                     │
//! storageProof ──walk(keccak256(slot))────────────────┘──▶ value (cached)
//! ```
//!
//! Slot values are raw 256-bit words; scaling and unpacking belong to the
//! caller (see [`algorithms::slot_utils`]).
//!
//! ## Module Structure
//!
//! ```text
//! cc-02-proof-verifier/
//! ├── domain/          # AccountState, StorageSlot, Nibbles, errors
//! ├── algorithms/      # trie walk, header/account/slot extraction, slot utils
//! ├── ports/           # DataWarehouseApi
//! └── service.rs       # DataWarehouse
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use algorithms::{
    decode_proof, extract_account, extract_slot_value, get_account_slot_hash,
    get_nested_account_slot_hash, slot_key, state_root_from_header, verify_proof,
    DelegationMode, PackedDelegationBalance,
};
pub use domain::{
    AccountState, Nibbles, ProofError, StorageSlot, EMPTY_TRIE_ROOT, MAX_PROOF_DEPTH,
};
pub use ports::DataWarehouseApi;
pub use service::DataWarehouse;

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
