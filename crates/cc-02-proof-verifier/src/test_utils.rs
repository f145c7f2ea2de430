//! # Test Utilities
//!
//! Builds real Merkle-Patricia tries, block headers and proofs so that the
//! verifier and the voting strategy can be exercised end to end.
//!
//! Enable with the `test-utils` feature flag.

use std::collections::BTreeMap;

use cc_01_envelope_codec::keccak256;
use primitive_types::U256;
use rlp::RlpStream;
use shared_types::{u256_to_bytes, Address, Hash, ZERO_HASH};

use crate::domain::{Nibbles, EMPTY_TRIE_ROOT};

/// In-memory trie keyed by already-hashed 32-byte paths.
#[derive(Clone, Debug, Default)]
pub struct TrieFixture {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl TrieFixture {
    /// Empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` at `path`.
    pub fn insert(&mut self, path: Hash, value: Vec<u8>) {
        self.entries.insert(Nibbles::from_bytes(&path).0, value);
    }

    /// Root hash.
    pub fn root(&self) -> Hash {
        if self.entries.is_empty() {
            return EMPTY_TRIE_ROOT;
        }
        keccak256(&build(&self.sorted(), 0, None, &mut Vec::new()))
    }

    /// Proof nodes from the root towards `path` (inclusion or absence).
    pub fn proof(&self, path: &Hash) -> Vec<Vec<u8>> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let target = Nibbles::from_bytes(path).0;
        let mut below = Vec::new();
        let root = build(&self.sorted(), 0, Some(&target), &mut below);
        let mut proof = vec![root];
        proof.extend(below);
        proof
    }

    fn sorted(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Encode proof nodes as the RLP list accepted by the data warehouse.
pub fn encode_proof(nodes: &[Vec<u8>]) -> Vec<u8> {
    let mut stream = RlpStream::new_list(nodes.len());
    for node in nodes {
        stream.append_raw(node, 1);
    }
    stream.out().to_vec()
}

/// Encode the node for `entries` (all sharing the first `depth` nibbles).
///
/// Hash-referenced nodes strictly below this one on the `target` path are
/// appended to `proof_below` in root-to-leaf order.
fn build(
    entries: &[(Vec<u8>, Vec<u8>)],
    depth: usize,
    target: Option<&[u8]>,
    proof_below: &mut Vec<Vec<u8>>,
) -> Vec<u8> {
    if let [(path, value)] = entries {
        let mut stream = RlpStream::new_list(2);
        stream.append(&Nibbles(path[depth..].to_vec()).encode_hex_prefix(true));
        stream.append(value);
        return stream.out().to_vec();
    }

    let prefix = common_prefix(entries, depth);
    if prefix > 0 {
        let shared = &entries[0].0[depth..depth + prefix];
        let child_target = target.filter(|t| &t[depth..depth + prefix] == shared);
        let child = build_child(entries, depth + prefix, child_target, proof_below);
        let mut stream = RlpStream::new_list(2);
        stream.append(&Nibbles(shared.to_vec()).encode_hex_prefix(false));
        append_ref(&mut stream, &child);
        return stream.out().to_vec();
    }

    let mut stream = RlpStream::new_list(17);
    for nibble in 0..16u8 {
        let group: Vec<_> = entries
            .iter()
            .filter(|(path, _)| path[depth] == nibble)
            .cloned()
            .collect();
        if group.is_empty() {
            stream.append_empty_data();
            continue;
        }
        let child_target = target.filter(|t| t[depth] == nibble);
        let child = build_child(&group, depth + 1, child_target, proof_below);
        append_ref(&mut stream, &child);
    }
    stream.append_empty_data();
    stream.out().to_vec()
}

fn build_child(
    entries: &[(Vec<u8>, Vec<u8>)],
    depth: usize,
    target: Option<&[u8]>,
    proof_below: &mut Vec<Vec<u8>>,
) -> Vec<u8> {
    let mut child_below = Vec::new();
    let child = build(entries, depth, target, &mut child_below);
    if target.is_some() {
        if child.len() >= 32 {
            proof_below.push(child.clone());
        }
        proof_below.extend(child_below);
    }
    child
}

fn append_ref(stream: &mut RlpStream, child: &[u8]) {
    if child.len() < 32 {
        stream.append_raw(child, 1);
    } else {
        stream.append(&keccak256(child).to_vec());
    }
}

fn common_prefix(entries: &[(Vec<u8>, Vec<u8>)], depth: usize) -> usize {
    let first = &entries[0].0;
    let mut len = 0;
    while depth + len < first.len()
        && entries
            .iter()
            .all(|(path, _)| path[depth + len] == first[depth + len])
    {
        len += 1;
    }
    len
}

fn trimmed(value: U256) -> Vec<u8> {
    let bytes = u256_to_bytes(value);
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

/// World state of a few contracts at one block, with a matching header.
#[derive(Clone, Debug)]
pub struct StateFixture {
    accounts: BTreeMap<Address, BTreeMap<Hash, U256>>,
    /// Header block number.
    pub block_number: u64,
    /// Header timestamp.
    pub timestamp: u64,
}

impl StateFixture {
    /// Empty state at `block_number`.
    pub fn new(block_number: u64) -> Self {
        Self {
            accounts: BTreeMap::new(),
            block_number,
            timestamp: 1_700_000_000,
        }
    }

    /// Create an account with empty storage.
    pub fn add_account(&mut self, account: Address) -> &mut Self {
        self.accounts.entry(account).or_default();
        self
    }

    /// Write a storage slot (zero values are not stored, as on chain).
    pub fn set_slot(&mut self, account: Address, slot: Hash, value: U256) -> &mut Self {
        let storage = self.accounts.entry(account).or_default();
        if value.is_zero() {
            storage.remove(&slot);
        } else {
            storage.insert(slot, value);
        }
        self
    }

    fn storage_trie(&self, account: &Address) -> TrieFixture {
        let mut trie = TrieFixture::new();
        if let Some(storage) = self.accounts.get(account) {
            for (slot, value) in storage {
                trie.insert(keccak256(slot), rlp::encode(&trimmed(*value)).to_vec());
            }
        }
        trie
    }

    fn state_trie(&self) -> TrieFixture {
        let mut trie = TrieFixture::new();
        for account in self.accounts.keys() {
            let mut leaf = RlpStream::new_list(4);
            leaf.append(&1u64);
            leaf.append_empty_data();
            leaf.append(&self.storage_root(account).to_vec());
            leaf.append(&keccak256(&[]).to_vec());
            trie.insert(keccak256(account), leaf.out().to_vec());
        }
        trie
    }

    /// Storage root of `account`.
    pub fn storage_root(&self, account: &Address) -> Hash {
        self.storage_trie(account).root()
    }

    /// State root.
    pub fn state_root(&self) -> Hash {
        self.state_trie().root()
    }

    /// RLP block header with the state root at index 3.
    pub fn header(&self) -> Vec<u8> {
        let mut header = RlpStream::new_list(15);
        header.append(&ZERO_HASH.to_vec());
        header.append(&keccak256(&[0xc0]).to_vec());
        header.append(&[0u8; 20].to_vec());
        header.append(&self.state_root().to_vec());
        header.append(&EMPTY_TRIE_ROOT.to_vec());
        header.append(&EMPTY_TRIE_ROOT.to_vec());
        header.append(&vec![0u8; 256]);
        header.append(&0u64);
        header.append(&self.block_number);
        header.append(&30_000_000u64);
        header.append(&0u64);
        header.append(&self.timestamp);
        header.append(&b"cc".to_vec());
        header.append(&ZERO_HASH.to_vec());
        header.append(&[0u8; 8].to_vec());
        header.out().to_vec()
    }

    /// keccak256 of the header.
    pub fn block_hash(&self) -> Hash {
        keccak256(&self.header())
    }

    /// Encoded account proof.
    pub fn account_proof(&self, account: &Address) -> Vec<u8> {
        encode_proof(&self.state_trie().proof(&keccak256(account)))
    }

    /// Encoded storage proof for `slot` of `account`.
    pub fn storage_proof(&self, account: &Address, slot: &Hash) -> Vec<u8> {
        encode_proof(&self.storage_trie(account).proof(&keccak256(slot)))
    }
}
