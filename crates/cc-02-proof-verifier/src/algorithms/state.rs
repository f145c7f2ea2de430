//! # State Extraction
//!
//! Header, account and storage-slot extraction on top of the trie walk.

use cc_01_envelope_codec::keccak256;
use primitive_types::U256;
use rlp::Rlp;
use shared_types::{Address, Hash};

use super::trie::verify_proof;
use crate::domain::{AccountState, ProofError, StorageSlot, HEADER_STATE_ROOT_INDEX};

/// Check `keccak256(header) == block_hash` and return the header's state root.
pub fn state_root_from_header(block_hash: &Hash, header: &[u8]) -> Result<Hash, ProofError> {
    let computed = keccak256(header);
    if computed != *block_hash {
        return Err(ProofError::InvalidBlockHash {
            claimed: *block_hash,
            computed,
        });
    }

    let rlp = Rlp::new(header);
    if !rlp.is_list() {
        return Err(ProofError::InvalidHeader("header is not an RLP list".into()));
    }
    let items = rlp.item_count()?;
    if items <= HEADER_STATE_ROOT_INDEX {
        return Err(ProofError::InvalidHeader(format!("header has {items} items")));
    }
    to_hash(rlp.at(HEADER_STATE_ROOT_INDEX)?.data()?)
        .ok_or_else(|| ProofError::InvalidHeader("state root is not 32 bytes".into()))
}

/// Prove an account against a state root. `None` means the proof shows absence.
pub fn extract_account(
    state_root: &Hash,
    account: &Address,
    proof: &[Vec<u8>],
) -> Result<Option<AccountState>, ProofError> {
    let path = keccak256(account);
    verify_proof(state_root, &path, proof)?
        .map(|leaf| decode_account(&leaf))
        .transpose()
}

/// Prove a storage slot against an account's storage root.
pub fn extract_slot_value(
    storage_root: &Hash,
    slot: &Hash,
    proof: &[Vec<u8>],
) -> Result<StorageSlot, ProofError> {
    let path = keccak256(slot);
    match verify_proof(storage_root, &path, proof)? {
        None => Ok(StorageSlot::absent()),
        Some(leaf) => {
            let bytes = Rlp::new(&leaf).data()?;
            if bytes.len() > 32 {
                return Err(ProofError::InvalidSlotValue);
            }
            Ok(StorageSlot::found(U256::from_big_endian(bytes)))
        }
    }
}

fn decode_account(leaf: &[u8]) -> Result<AccountState, ProofError> {
    let rlp = Rlp::new(leaf);
    if !rlp.is_list() || rlp.item_count()? != 4 {
        return Err(ProofError::InvalidAccount("expected a 4-item list".into()));
    }

    let nonce_bytes = rlp.at(0)?.data()?;
    let balance_bytes = rlp.at(1)?.data()?;
    if nonce_bytes.len() > 8 || balance_bytes.len() > 32 {
        return Err(ProofError::InvalidAccount("integer too wide".into()));
    }
    let nonce = nonce_bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));

    let storage_root = to_hash(rlp.at(2)?.data()?)
        .ok_or_else(|| ProofError::InvalidAccount("storage root is not 32 bytes".into()))?;
    let code_hash = to_hash(rlp.at(3)?.data()?)
        .ok_or_else(|| ProofError::InvalidAccount("code hash is not 32 bytes".into()))?;

    Ok(AccountState {
        nonce,
        balance: U256::from_big_endian(balance_bytes),
        storage_root,
        code_hash,
    })
}

fn to_hash(bytes: &[u8]) -> Option<Hash> {
    if bytes.len() != 32 {
        return None;
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(bytes);
    Some(hash)
}
