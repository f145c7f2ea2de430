//! # Outbound Ports
//!
//! What governance and the voting machine need from the outside world.

use cc_01_envelope_codec::VotingAssetWithSlot;
use shared_types::{Address, ChainId, Hash, U256};

use crate::domain::GovernanceError;

/// Sends a message to another chain - outbound port.
///
/// Implemented by the cross-chain controller; `sender` must be an approved
/// sender there.
pub trait MessageForwarder: Send + Sync {
    /// Forward `message` and return the envelope id.
    fn forward_message(
        &self,
        sender: &Address,
        destination_chain_id: ChainId,
        destination: Address,
        gas_limit: u64,
        message: Vec<u8>,
    ) -> Result<Hash, GovernanceError>;

    /// Fail if `sender` could not forward to `destination_chain_id` now.
    /// Sends nothing.
    fn check_route(&self, sender: &Address, destination_chain_id: ChainId) -> Result<(), GovernanceError>;
}

/// Proposition power source - outbound port.
pub trait PropositionPowerStrategy: Send + Sync {
    /// Identity reported in `PowerStrategyUpdated`.
    fn address(&self) -> Address;

    /// Current proposition power of `user`, own plus delegated.
    fn get_full_proposition_power(&self, user: &Address) -> U256;
}

/// Voting portal as seen by governance - outbound port.
pub trait VotingPortalPort: Send + Sync {
    /// Ask the voting chain to open voting on a proposal.
    fn forward_start_voting_message(
        &self,
        caller: &Address,
        proposal_id: u64,
        block_hash: Hash,
        voting_duration: u32,
    ) -> Result<(), GovernanceError>;

    /// Carry a vote cast on the governance chain to the voting chain.
    fn forward_vote_message(
        &self,
        caller: &Address,
        proposal_id: u64,
        voter: &Address,
        support: bool,
        voting_assets_with_slot: &[VotingAssetWithSlot],
    ) -> Result<(), GovernanceError>;
}
