//! Per-chain emergency counters raised by the owner.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{AccessControl, Address, ChainId};
use tracing::warn;

use crate::domain::RegistryError;

/// Emergency registry.
pub struct EmergencyRegistry {
    access: AccessControl,
    events: Arc<dyn EventPublisher>,
    counts: HashMap<ChainId, u64>,
}

impl EmergencyRegistry {
    /// Create a registry with every chain at emergency count zero.
    pub fn new(access: AccessControl, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            access,
            events,
            counts: HashMap::new(),
        }
    }

    /// Raise one emergency on each listed chain.
    pub fn set_emergency(&mut self, caller: &Address, chain_ids: &[ChainId]) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;

        let mut seen = HashSet::with_capacity(chain_ids.len());
        if let Some(repeated) = chain_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(RegistryError::OnlyOneEmergencyUpdatePerChain(*repeated));
        }

        for chain_id in chain_ids {
            let count = self.counts.entry(*chain_id).or_insert(0);
            *count += 1;
            warn!(chain_id, emergency_number = *count, "[cc-03] Network emergency raised");
            self.events.publish(ProtocolEvent::NetworkEmergencyStateUpdated {
                chain_id: *chain_id,
                emergency_number: *count,
            });
        }
        Ok(())
    }

    /// Emergencies raised so far on `chain_id`.
    pub fn get_network_emergency_count(&self, chain_id: ChainId) -> u64 {
        self.counts.get(&chain_id).copied().unwrap_or(0)
    }
}
