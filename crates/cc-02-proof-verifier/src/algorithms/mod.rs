//! # Algorithms
//!
//! Trie walk, state extraction and storage layout helpers.

pub mod slot_utils;
pub mod state;
pub mod trie;

pub use slot_utils::{
    extract_bits, get_account_slot_hash, get_nested_account_slot_hash, slot_key, DelegationMode,
    PackedDelegationBalance,
};
pub use state::{extract_account, extract_slot_value, state_root_from_header};
pub use trie::{decode_proof, verify_proof};
