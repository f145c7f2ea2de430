//! # Merkle-Patricia Proof Walk
//!
//! Iterative verification of an Ethereum trie proof.
//!
//! A proof is the list of RLP-encoded nodes on the path from the root to the
//! key. Each node must hash to the reference held by its parent; children
//! shorter than 32 bytes are embedded in the parent and consume no proof
//! item. The walk is a loop bounded by [`MAX_PROOF_DEPTH`], never recursion.

use std::borrow::Cow;

use cc_01_envelope_codec::keccak256;
use rlp::Rlp;
use shared_types::Hash;

use crate::domain::{Nibbles, ProofError, EMPTY_TRIE_ROOT, MAX_PROOF_DEPTH};

/// Reference from a parent node to a child.
enum NodeRef {
    Hash(Hash),
    Inline(Vec<u8>),
}

/// Outcome of processing one node.
enum Step {
    Next(NodeRef),
    Done(Option<Vec<u8>>),
}

/// Split an RLP list of proof nodes into individual node encodings.
pub fn decode_proof(encoded: &[u8]) -> Result<Vec<Vec<u8>>, ProofError> {
    let rlp = Rlp::new(encoded);
    if !rlp.is_list() {
        return Err(ProofError::InvalidNode("proof is not an RLP list".into()));
    }
    let mut nodes = Vec::with_capacity(rlp.item_count()?);
    for item in rlp.iter() {
        if item.is_list() {
            nodes.push(item.as_raw().to_vec());
        } else {
            nodes.push(item.data()?.to_vec());
        }
    }
    Ok(nodes)
}

/// Walk `proof` from `root` along the nibbles of `path`.
///
/// Returns the leaf value, or `None` when the proof shows the key is absent.
/// The caller hashes the key (`keccak256(address)` or `keccak256(slot)`).
pub fn verify_proof(
    root: &Hash,
    path: &[u8],
    proof: &[Vec<u8>],
) -> Result<Option<Vec<u8>>, ProofError> {
    if proof.len() > MAX_PROOF_DEPTH {
        return Err(ProofError::ProofTooDeep {
            depth: proof.len(),
            max: MAX_PROOF_DEPTH,
        });
    }
    if proof.is_empty() {
        return if *root == EMPTY_TRIE_ROOT {
            Ok(None)
        } else {
            Err(ProofError::EmptyProof)
        };
    }

    let key = Nibbles::from_bytes(path);
    let mut consumed = 0usize;
    let mut index = 0usize;
    let mut expected = NodeRef::Hash(*root);

    for _ in 0..MAX_PROOF_DEPTH {
        let node: Cow<'_, [u8]> = match expected {
            NodeRef::Hash(hash) => {
                let node = proof.get(index).ok_or(ProofError::IncompleteProof)?;
                if keccak256(node) != hash {
                    return Err(ProofError::NodeHashMismatch { index });
                }
                index += 1;
                Cow::Borrowed(node.as_slice())
            }
            NodeRef::Inline(bytes) => Cow::Owned(bytes),
        };

        match walk_node(&node, &key, &mut consumed)? {
            Step::Next(next) => expected = next,
            Step::Done(value) => {
                if index < proof.len() {
                    return Err(ProofError::TrailingNodes(proof.len() - index));
                }
                return Ok(value);
            }
        }
    }

    Err(ProofError::ProofTooDeep {
        depth: MAX_PROOF_DEPTH + 1,
        max: MAX_PROOF_DEPTH,
    })
}

fn walk_node(node: &[u8], key: &Nibbles, consumed: &mut usize) -> Result<Step, ProofError> {
    let rlp = Rlp::new(node);
    match rlp.item_count()? {
        17 => {
            if *consumed == key.len() {
                let value = rlp.at(16)?.data()?;
                return Ok(Step::Done((!value.is_empty()).then(|| value.to_vec())));
            }
            let nibble = usize::from(key.0[*consumed]);
            *consumed += 1;
            Ok(match child_ref(&rlp.at(nibble)?)? {
                Some(child) => Step::Next(child),
                None => Step::Done(None),
            })
        }
        2 => {
            let (path, is_leaf) = Nibbles::decode_hex_prefix(rlp.at(0)?.data()?)
                .ok_or_else(|| ProofError::InvalidNode("bad hex-prefix path".into()))?;
            let remaining = key.tail(*consumed);

            if is_leaf {
                if remaining == path.0.as_slice() {
                    return Ok(Step::Done(Some(rlp.at(1)?.data()?.to_vec())));
                }
                return Ok(Step::Done(None));
            }

            if !remaining.starts_with(&path.0) {
                return Ok(Step::Done(None));
            }
            *consumed += path.len();
            let child = child_ref(&rlp.at(1)?)?
                .ok_or_else(|| ProofError::InvalidNode("extension without child".into()))?;
            Ok(Step::Next(child))
        }
        n => Err(ProofError::InvalidNode(format!("node has {n} items"))),
    }
}

fn child_ref(item: &Rlp<'_>) -> Result<Option<NodeRef>, ProofError> {
    if item.is_list() {
        return Ok(Some(NodeRef::Inline(item.as_raw().to_vec())));
    }
    let data = item.data()?;
    match data.len() {
        0 => Ok(None),
        32 => {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(data);
            Ok(Some(NodeRef::Hash(hash)))
        }
        n => Err(ProofError::InvalidNode(format!("child reference of {n} bytes"))),
    }
}
