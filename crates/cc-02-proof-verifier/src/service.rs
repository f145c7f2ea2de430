//! # Data Warehouse Service
//!
//! Stores proven storage roots and slot values per block.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use primitive_types::U256;
use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{to_hex, Address, Hash, ZERO_HASH};
use tracing::{debug, info};

use crate::algorithms::{decode_proof, extract_account, extract_slot_value, state_root_from_header};
use crate::domain::{ProofError, StorageSlot};
use crate::ports::DataWarehouseApi;

/// Data warehouse - registry of proven storage.
pub struct DataWarehouse {
    /// (account, block hash) -> storage root.
    storage_roots: RwLock<HashMap<(Address, Hash), Hash>>,
    /// (block hash, account, slot) -> value.
    registered_slots: RwLock<HashMap<(Hash, Address, Hash), U256>>,
    /// Event sink.
    events: Arc<dyn EventPublisher>,
}

impl DataWarehouse {
    /// Create an empty warehouse.
    pub fn new(events: Arc<dyn EventPublisher>) -> Self {
        Self {
            storage_roots: RwLock::new(HashMap::new()),
            registered_slots: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn storage_root_for(&self, account: Address, block_hash: Hash) -> Result<Hash, ProofError> {
        self.storage_roots
            .read()
            .get(&(account, block_hash))
            .copied()
            .ok_or(ProofError::MissingStorageRoot {
                account,
                block_hash,
            })
    }

    fn prove_slot(
        storage_root: &Hash,
        slot: &Hash,
        storage_proof: &[u8],
    ) -> Result<StorageSlot, ProofError> {
        let nodes = decode_proof(storage_proof)?;
        extract_slot_value(storage_root, slot, &nodes)
    }
}

impl DataWarehouseApi for DataWarehouse {
    fn process_storage_root(
        &self,
        caller: Address,
        account: Address,
        block_hash: Hash,
        block_header: &[u8],
        account_state_proof: &[u8],
    ) -> Result<Hash, ProofError> {
        let state_root = state_root_from_header(&block_hash, block_header)?;
        let nodes = decode_proof(account_state_proof)?;
        let account_state = extract_account(&state_root, &account, &nodes)?
            .ok_or(ProofError::AccountDoesNotExist(account))?;

        self.storage_roots
            .write()
            .insert((account, block_hash), account_state.storage_root);

        info!(
            account = %to_hex(&account),
            block_hash = %to_hex(&block_hash),
            storage_root = %to_hex(&account_state.storage_root),
            "[cc-02] Storage root processed"
        );
        self.events.publish(ProtocolEvent::StorageRootProcessed {
            caller,
            account,
            block_hash,
        });
        Ok(account_state.storage_root)
    }

    fn process_storage_slot(
        &self,
        caller: Address,
        account: Address,
        block_hash: Hash,
        slot: Hash,
        storage_proof: &[u8],
    ) -> Result<U256, ProofError> {
        let storage_root = self.storage_root_for(account, block_hash)?;
        let value = Self::prove_slot(&storage_root, &slot, storage_proof)?.value;

        self.registered_slots
            .write()
            .insert((block_hash, account, slot), value);

        debug!(
            account = %to_hex(&account),
            slot = %to_hex(&slot),
            %value,
            "[cc-02] Storage slot processed"
        );
        self.events.publish(ProtocolEvent::StorageSlotProcessed {
            caller,
            account,
            block_hash,
            slot,
            value,
        });
        Ok(value)
    }

    fn get_storage(
        &self,
        account: Address,
        block_hash: Hash,
        slot: Hash,
        storage_proof: &[u8],
    ) -> Result<StorageSlot, ProofError> {
        let storage_root = self.storage_root_for(account, block_hash)?;
        Ok(Self::prove_slot(&storage_root, &slot, storage_proof).unwrap_or_else(|e| {
            debug!(error = %e, "[cc-02] Storage proof rejected");
            StorageSlot::absent()
        }))
    }

    fn get_storage_roots(&self, account: Address, block_hash: Hash) -> Hash {
        self.storage_roots
            .read()
            .get(&(account, block_hash))
            .copied()
            .unwrap_or(ZERO_HASH)
    }

    fn get_registered_slot(&self, block_hash: Hash, account: Address, slot: Hash) -> U256 {
        self.registered_slots
            .read()
            .get(&(block_hash, account, slot))
            .copied()
            .unwrap_or_default()
    }
}
