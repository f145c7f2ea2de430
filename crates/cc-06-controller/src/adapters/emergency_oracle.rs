//! Emergency oracle reading one chain's counter from an emergency registry.

use std::sync::Arc;

use cc_03_adapter_registry::EmergencyRegistry;
use parking_lot::RwLock;
use shared_types::ChainId;

use crate::ports::EmergencyOracle;

/// Oracle backed by an [`EmergencyRegistry`].
pub struct RegistryEmergencyOracle {
    registry: Arc<RwLock<EmergencyRegistry>>,
    chain_id: ChainId,
}

impl RegistryEmergencyOracle {
    /// Report `chain_id`'s emergency count from `registry`.
    pub fn new(registry: Arc<RwLock<EmergencyRegistry>>, chain_id: ChainId) -> Self {
        Self { registry, chain_id }
    }
}

impl EmergencyOracle for RegistryEmergencyOracle {
    fn latest_emergency_count(&self) -> u64 {
        self.registry.read().get_network_emergency_count(self.chain_id)
    }
}
