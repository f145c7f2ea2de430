//! # Outbound Ports
//!
//! Bridge adapters the forwarder dispatches through.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{Address, ChainId};

use crate::domain::AdapterResult;

/// Bridge adapter - outbound port.
///
/// One implementation per bridge technology. Wire formats stay behind this
/// trait; the forwarder only sees success or failure.
pub trait BridgeAdapter: Send + Sync {
    /// Send `message` to `receiver` (the adapter on the destination chain).
    fn forward_message(
        &self,
        receiver: &Address,
        gas_limit: u64,
        destination_chain_id: ChainId,
        message: &[u8],
    ) -> AdapterResult;

    /// Human-readable adapter name for logs.
    fn name(&self) -> &str {
        "bridge-adapter"
    }
}

/// Adapter implementations bound to their configured addresses.
#[derive(Default)]
pub struct AdapterBook {
    adapters: RwLock<HashMap<Address, Arc<dyn BridgeAdapter>>>,
}

impl AdapterBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an implementation to `address`, replacing any previous binding.
    pub fn bind(&self, address: Address, adapter: Arc<dyn BridgeAdapter>) {
        self.adapters.write().insert(address, adapter);
    }

    /// Remove a binding.
    pub fn unbind(&self, address: &Address) -> Option<Arc<dyn BridgeAdapter>> {
        self.adapters.write().remove(address)
    }

    /// Implementation bound to `address`.
    pub fn get(&self, address: &Address) -> Option<Arc<dyn BridgeAdapter>> {
        self.adapters.read().get(address).cloned()
    }

    /// Number of bound adapters.
    pub fn len(&self) -> usize {
        self.adapters.read().len()
    }

    /// True when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.adapters.read().is_empty()
    }
}
