//! Controller configuration.

use serde::{Deserialize, Serialize};
use shared_types::{address_from_u64, chains, Address, ChainId, ZERO_ADDRESS};

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Chain this controller lives on. Must match the chain context.
    pub chain_id: ChainId,
    /// Configuration owner.
    pub owner: Address,
    /// Guardian allowed to retry and to solve emergencies.
    pub guardian: Address,
    /// Address of the emergency oracle consulted by `solve_emergency`.
    pub emergency_oracle: Address,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            chain_id: chains::ETHEREUM,
            owner: ZERO_ADDRESS,
            guardian: ZERO_ADDRESS,
            emergency_oracle: ZERO_ADDRESS,
        }
    }
}

impl ControllerConfig {
    /// Config with fixed owner, guardian and oracle addresses on `chain_id`.
    pub fn for_testing(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            owner: [0x01; 20],
            guardian: [0x02; 20],
            emergency_oracle: address_from_u64(0xE0),
        }
    }
}
