//! # Chain Context
//!
//! Ambient inputs read at call time: the local chain id, the current
//! timestamp, the block number and the latest block hash.
//!
//! Every operation runs to completion against one reading of the context,
//! so services take an `Arc<dyn ChainContext>` instead of reading the system
//! clock directly.

use crate::primitives::{ChainId, Hash, Timestamp, ZERO_HASH};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Ambient chain inputs - outbound port.
pub trait ChainContext: Send + Sync {
    /// Chain id of the chain this service lives on.
    fn chain_id(&self) -> ChainId;

    /// Current block timestamp.
    fn now(&self) -> Timestamp;

    /// Current block number.
    fn block_number(&self) -> u64;

    /// Hash of the previous block (snapshot reference for votes).
    fn latest_block_hash(&self) -> Hash;
}

/// Manually driven context for simulations and tests.
///
/// Time only moves when [`ManualChainContext::advance`] is called; each
/// advance also mines one block.
#[derive(Debug)]
pub struct ManualChainContext {
    chain_id: ChainId,
    now: AtomicU64,
    block_number: AtomicU64,
    latest_block_hash: RwLock<Hash>,
}

impl ManualChainContext {
    /// Create a context at the given chain id and start time.
    pub fn new(chain_id: ChainId, start: Timestamp) -> Self {
        Self {
            chain_id,
            now: AtomicU64::new(start),
            block_number: AtomicU64::new(1),
            latest_block_hash: RwLock::new(ZERO_HASH),
        }
    }

    /// Move time forward by `seconds` and mine one block.
    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
        self.block_number.fetch_add(1, Ordering::SeqCst);
    }

    /// Pin the current timestamp.
    pub fn set_now(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Set the hash reported as the latest block hash.
    pub fn set_latest_block_hash(&self, hash: Hash) {
        *self.latest_block_hash.write() = hash;
    }
}

impl ChainContext for ManualChainContext {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }

    fn block_number(&self) -> u64 {
        self.block_number.load(Ordering::SeqCst)
    }

    fn latest_block_hash(&self) -> Hash {
        *self.latest_block_hash.read()
    }
}

/// Wall-clock context. Block number and hash are not tracked.
#[derive(Clone, Debug)]
pub struct SystemChainContext {
    chain_id: ChainId,
}

impl SystemChainContext {
    /// Create a wall-clock context for `chain_id`.
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }
}

impl ChainContext for SystemChainContext {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn block_number(&self) -> u64 {
        0
    }

    fn latest_block_hash(&self) -> Hash {
        ZERO_HASH
    }
}
