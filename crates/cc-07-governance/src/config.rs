//! # Governance Configuration
//!
//! Configuration for governance, the voting portal, the voting machine, the
//! voting strategy assets and the payloads controller.
//!
//! Addresses are identities on the local controller: governance, portal and
//! voting machine must be approved senders there, and portal, voting
//! machine and payloads controller are bound as destination handlers.

use serde::{Deserialize, Serialize};
use shared_types::{address_from_u64, chains, Address, ChainId, U256, ZERO_ADDRESS};

use crate::domain::AccessLevel;

/// Delay between queuing and execution.
pub const COOLDOWN_PERIOD: u64 = 24 * 60 * 60;

/// Age after which an unexecuted proposal expires.
pub const PROPOSAL_EXPIRATION_TIME: u64 = 30 * 24 * 60 * 60;

/// Maximum assets one vote via portal may name.
pub const VOTING_TOKENS_CAP: usize = 6;

/// Gas limit attached to payload execution messages.
pub const DEFAULT_EXECUTION_GAS_LIMIT: u64 = 200_000;

/// Gas limit attached to messages sent to voting chains.
pub const DEFAULT_VOTING_GAS_LIMIT: u64 = 300_000;

/// Gas limit attached to vote results.
pub const DEFAULT_RESULTS_GAS_LIMIT: u64 = 250_000;

/// `amount` whole tokens with 18 decimals.
pub fn with_decimals(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

/// Voting rules for one access level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Level these rules apply to.
    pub access_level: AccessLevel,
    /// Minimum age of a proposal before voting can be activated.
    pub cooldown_before_voting_start: u64,
    /// Voting duration (fits in 24 bits).
    pub voting_duration: u32,
    /// Minimum votes in favour.
    pub yes_threshold: U256,
    /// Minimum lead of votes in favour over votes against.
    pub yes_no_differential: U256,
    /// Proposition power needed to create and keep a proposal.
    pub min_proposition_power: U256,
}

impl VotingConfig {
    /// Level 1 defaults: 1 day cooldown, 7 days of voting.
    pub fn level_1() -> Self {
        Self {
            access_level: AccessLevel::Level1,
            cooldown_before_voting_start: 24 * 60 * 60,
            voting_duration: 7 * 24 * 60 * 60,
            yes_threshold: with_decimals(320_000),
            yes_no_differential: with_decimals(100_000),
            min_proposition_power: with_decimals(50_000),
        }
    }

    /// Level 2 defaults: 1 day cooldown, 10 days of voting.
    pub fn level_2() -> Self {
        Self {
            access_level: AccessLevel::Level2,
            cooldown_before_voting_start: 24 * 60 * 60,
            voting_duration: 10 * 24 * 60 * 60,
            yes_threshold: with_decimals(350_000),
            yes_no_differential: with_decimals(120_000),
            min_proposition_power: with_decimals(80_000),
        }
    }
}

/// Governance configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Governance identity on the local controller.
    pub address: Address,
    /// May approve portals and change configs.
    pub owner: Address,
    /// May cancel proposals and rescue portals.
    pub guardian: Address,
    /// Delay between queuing and execution.
    pub cooldown_period: u64,
    /// Age after which an unexecuted proposal expires.
    pub proposal_expiration_time: u64,
    /// Maximum assets per vote via portal.
    pub voting_tokens_cap: usize,
    /// Gas limit for payload execution messages.
    pub execution_gas_limit: u64,
    /// Voting rules per level.
    pub voting_configs: Vec<VotingConfig>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            address: ZERO_ADDRESS,
            owner: ZERO_ADDRESS,
            guardian: ZERO_ADDRESS,
            cooldown_period: COOLDOWN_PERIOD,
            proposal_expiration_time: PROPOSAL_EXPIRATION_TIME,
            voting_tokens_cap: VOTING_TOKENS_CAP,
            execution_gas_limit: DEFAULT_EXECUTION_GAS_LIMIT,
            voting_configs: vec![VotingConfig::level_1(), VotingConfig::level_2()],
        }
    }
}

impl GovernanceConfig {
    /// Default rules with fixed governance, owner and guardian addresses.
    pub fn for_testing() -> Self {
        Self {
            address: address_from_u64(0x60),
            owner: [0x01; 20],
            guardian: [0x02; 20],
            ..Self::default()
        }
    }
}

/// Voting portal configuration (governance chain).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingPortalConfig {
    /// Portal identity on the governance-chain controller.
    pub address: Address,
    /// Governance allowed to call the portal.
    pub governance: Address,
    /// Voting machine on the voting chain.
    pub voting_machine: Address,
    /// Voting chain.
    pub voting_machine_chain_id: ChainId,
    /// Gas limit for start-voting messages.
    pub start_voting_gas_limit: u64,
    /// Gas limit for vote messages.
    pub vote_via_portal_gas_limit: u64,
}

impl VotingPortalConfig {
    /// Portal towards a voting machine on `voting_machine_chain_id`.
    pub fn for_testing(voting_machine_chain_id: ChainId) -> Self {
        Self {
            address: address_from_u64(0x61),
            governance: address_from_u64(0x60),
            voting_machine: address_from_u64(0x62),
            voting_machine_chain_id,
            start_voting_gas_limit: DEFAULT_VOTING_GAS_LIMIT,
            vote_via_portal_gas_limit: DEFAULT_VOTING_GAS_LIMIT,
        }
    }
}

/// Voting machine configuration (voting chain).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingMachineConfig {
    /// Voting machine identity on the voting-chain controller.
    pub address: Address,
    /// Chain governance lives on.
    pub governance_chain_id: ChainId,
    /// Portal on the governance chain, the only accepted message origin and
    /// the destination of results.
    pub voting_portal: Address,
    /// Gas limit for result messages.
    pub results_gas_limit: u64,
}

impl VotingMachineConfig {
    /// Voting machine answering to the test portal on `governance_chain_id`.
    pub fn for_testing(governance_chain_id: ChainId) -> Self {
        Self {
            address: address_from_u64(0x62),
            governance_chain_id,
            voting_portal: address_from_u64(0x61),
            results_gas_limit: DEFAULT_RESULTS_GAS_LIMIT,
        }
    }
}

/// Token contracts the voting strategy accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingAssetsConfig {
    /// AAVE token.
    pub aave: Address,
    /// Staked AAVE.
    pub stk_aave: Address,
    /// aAAVE (AAVE deposited in the lending pool).
    pub a_aave: Address,
}

impl Default for VotingAssetsConfig {
    /// Ethereum mainnet deployments.
    fn default() -> Self {
        Self {
            aave: [
                0x7f, 0xc6, 0x65, 0x00, 0xc8, 0x4a, 0x76, 0xad, 0x7e, 0x9c, 0x93, 0x43, 0x7b, 0xfc,
                0x5a, 0xc3, 0x3e, 0x2d, 0xda, 0xe9,
            ],
            stk_aave: [
                0x4d, 0xa2, 0x7a, 0x54, 0x5c, 0x0c, 0x5b, 0x75, 0x8a, 0x6b, 0xa1, 0x00, 0xe3, 0xa0,
                0x49, 0x00, 0x1d, 0xe8, 0x70, 0xf5,
            ],
            a_aave: [
                0xa7, 0x00, 0xb4, 0xeb, 0x41, 0x6b, 0xe3, 0x5b, 0x29, 0x11, 0xfd, 0x5d, 0xee, 0x80,
                0x67, 0x8f, 0xf6, 0x4f, 0xf6, 0xc9,
            ],
        }
    }
}

impl VotingAssetsConfig {
    /// Short fixture addresses.
    pub fn for_testing() -> Self {
        Self {
            aave: address_from_u64(0xAA01),
            stk_aave: address_from_u64(0xAA02),
            a_aave: address_from_u64(0xAA03),
        }
    }
}

/// Payloads controller configuration (execution chain).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadsControllerConfig {
    /// Controller identity, the destination of execution messages.
    pub address: Address,
    /// Governance, the only accepted message origin.
    pub governance: Address,
    /// Chain governance lives on.
    pub governance_chain_id: ChainId,
}

impl Default for PayloadsControllerConfig {
    fn default() -> Self {
        Self {
            address: ZERO_ADDRESS,
            governance: ZERO_ADDRESS,
            governance_chain_id: chains::ETHEREUM,
        }
    }
}

impl PayloadsControllerConfig {
    /// Controller answering to the test governance on `governance_chain_id`.
    pub fn for_testing(governance_chain_id: ChainId) -> Self {
        Self {
            address: address_from_u64(0x63),
            governance: address_from_u64(0x60),
            governance_chain_id,
        }
    }
}
