//! Keccak-256, the id function for every content-addressed structure.

use sha3::{Digest, Keccak256};
use shared_types::Hash;

/// keccak256(data).
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
