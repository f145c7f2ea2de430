//! # Inbound Ports
//!
//! API trait defining what the data warehouse can do.

use primitive_types::U256;
use shared_types::{Address, Hash};

use crate::domain::{ProofError, StorageSlot};

/// Storage proof registry - inbound port.
///
/// Consumers (the voting strategy) read through this trait so they can be
/// wired to any warehouse instance.
pub trait DataWarehouseApi: Send + Sync {
    /// Verify `block_header` against `block_hash`, prove `account` against
    /// its state root and store the account's storage root.
    fn process_storage_root(
        &self,
        caller: Address,
        account: Address,
        block_hash: Hash,
        block_header: &[u8],
        account_state_proof: &[u8],
    ) -> Result<Hash, ProofError>;

    /// Prove `slot` against the stored storage root and cache its value.
    fn process_storage_slot(
        &self,
        caller: Address,
        account: Address,
        block_hash: Hash,
        slot: Hash,
        storage_proof: &[u8],
    ) -> Result<U256, ProofError>;

    /// Read-only slot proof. An invalid proof yields `exists = false`; a
    /// missing storage root is an error.
    fn get_storage(
        &self,
        account: Address,
        block_hash: Hash,
        slot: Hash,
        storage_proof: &[u8],
    ) -> Result<StorageSlot, ProofError>;

    /// Stored storage root, zero when unset.
    fn get_storage_roots(&self, account: Address, block_hash: Hash) -> Hash;

    /// Cached slot value, zero when unset.
    fn get_registered_slot(&self, block_hash: Hash, account: Address, slot: Hash) -> U256;
}
