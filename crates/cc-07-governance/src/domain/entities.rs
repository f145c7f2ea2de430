//! # Domain Entities
//!
//! Proposals on the governance chain, proposal votes on voting chains, and
//! the values exchanged between them.

use cc_01_envelope_codec::VotingAssetWithSlot;
use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId, Hash, Timestamp, U256};

use crate::domain::errors::GovernanceError;

/// Permission level a payload needs on its executor.
///
/// A proposal takes the highest level among its payloads, and that level
/// selects the voting configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    /// Unset. Never valid on a payload.
    Null,
    /// Ordinary parameter changes.
    Level1,
    /// Changes to governance itself.
    Level2,
}

impl TryFrom<u8> for AccessLevel {
    type Error = GovernanceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AccessLevel::Null),
            1 => Ok(AccessLevel::Level1),
            2 => Ok(AccessLevel::Level2),
            other => Err(GovernanceError::InvalidAccessLevel(other)),
        }
    }
}

impl From<AccessLevel> for u8 {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::Null => 0,
            AccessLevel::Level1 => 1,
            AccessLevel::Level2 => 2,
        }
    }
}

/// Governance proposal lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// No proposal with this id.
    #[default]
    Null,
    /// Waiting for voting activation.
    Created,
    /// Voting is open on the voting chain.
    Active,
    /// Passed; waiting for the execution cooldown.
    Queued,
    /// Payload execution messages were sent.
    Executed,
    /// Did not pass.
    Failed,
    /// Cancelled by the creator, the guardian, or anyone once the creator
    /// lost proposition power.
    Cancelled,
    /// Not executed within the expiration time.
    Expired,
}

/// One payload to execute on a target chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Chain the payloads controller lives on.
    pub chain: ChainId,
    /// Level required by the payload.
    pub access_level: AccessLevel,
    /// Payloads controller receiving the execution message.
    pub payloads_controller: Address,
    /// Payload id on that controller.
    pub payload_id: u64,
}

/// Governance-side proposal record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Stored state; [`Governance::get_proposal_state`] layers expiry on top.
    ///
    /// [`Governance::get_proposal_state`]: crate::Governance::get_proposal_state
    pub state: ProposalState,
    /// Highest access level among the payloads.
    pub access_level: AccessLevel,
    /// Proposer.
    pub creator: Address,
    /// Voting duration taken from the level config at creation.
    pub voting_duration: u32,
    /// Creation time.
    pub creation_time: Timestamp,
    /// Voting activation time, zero before activation.
    pub voting_activation_time: Timestamp,
    /// Queuing time, zero before queuing.
    pub queuing_time: Timestamp,
    /// Cancellation time, zero unless cancelled.
    pub cancel_timestamp: Timestamp,
    /// Portal carrying votes for this proposal.
    pub voting_portal: Address,
    /// Block whose state every vote is proven against.
    pub snapshot_block_hash: Hash,
    /// IPFS hash of the proposal description.
    pub ipfs_hash: Hash,
    /// Weighted votes in favour, set at queue time.
    pub for_votes: U256,
    /// Weighted votes against, set at queue time.
    pub against_votes: U256,
    /// Payloads executed when the proposal passes.
    pub payloads: Vec<Payload>,
}

/// Vote configuration bridged from governance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVoteConfiguration {
    /// Voting duration in seconds.
    pub voting_duration: u32,
    /// Governance-chain block the votes are proven against.
    pub l1_proposal_block_hash: Hash,
}

/// Voting-chain view of a proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVote {
    /// Governance proposal id.
    pub id: u64,
    /// Vote start.
    pub start_time: Timestamp,
    /// Vote end.
    pub end_time: Timestamp,
    /// Block the vote started in.
    pub creation_block_number: u64,
    /// Weighted votes in favour.
    pub for_votes: U256,
    /// Weighted votes against.
    pub against_votes: U256,
    /// Block the results were sent in.
    pub voting_closed_and_sent_block_number: u64,
    /// Time the results were sent.
    pub voting_closed_and_sent_timestamp: Timestamp,
    /// Results were sent to governance.
    pub sent_to_governance: bool,
}

/// Voting-chain proposal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalVoteState {
    /// Vote never started.
    NotCreated,
    /// Votes accepted.
    Active,
    /// Voting over, results not sent.
    Finished,
    /// Results sent to governance.
    SentToGovernance,
}

/// A counted vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// For (true) or against.
    pub support: bool,
    /// Weighted voting power.
    pub voting_power: U256,
}

/// A vote cast through the portal, waiting for its proofs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgedVote {
    /// For (true) or against.
    pub support: bool,
    /// Assets the settlement proofs must cover, in order.
    pub voting_assets_with_slot: Vec<VotingAssetWithSlot>,
}

/// Storage proof of one voting asset balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingBalanceProof {
    /// Token contract on the governance chain.
    pub underlying_asset: Address,
    /// Balance mapping slot.
    pub slot: u128,
    /// RLP-encoded storage proof of the voter's slot.
    pub proof: Vec<u8>,
}

impl VotingBalanceProof {
    /// The asset/slot pair this proof is for.
    pub fn asset_with_slot(&self) -> VotingAssetWithSlot {
        VotingAssetWithSlot::new(self.underlying_asset, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_level_from_u8() {
        assert_eq!(AccessLevel::try_from(2).unwrap(), AccessLevel::Level2);
        assert_eq!(u8::from(AccessLevel::Level1), 1);
        assert_eq!(
            AccessLevel::try_from(3),
            Err(GovernanceError::InvalidAccessLevel(3))
        );
    }

    #[test]
    fn test_access_level_ordering() {
        let payloads = [AccessLevel::Level1, AccessLevel::Level2, AccessLevel::Level1];
        assert_eq!(payloads.iter().max(), Some(&AccessLevel::Level2));
    }
}
