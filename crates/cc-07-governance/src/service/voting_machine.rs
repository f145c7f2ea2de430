//! # Voting Machine
//!
//! Voting-chain side of governance. Proposal configurations and portal
//! votes arrive as cross-chain messages; voters prove their balances at the
//! proposal's snapshot block; results go back to the portal once voting
//! ends.
//!
//! ## Vote lifecycle
//!
//! ```text
//! NotCreated --start--> Active --(now >= end)--> Finished --close--> SentToGovernance
//! ```
//!
//! The window is `[start_time, end_time)`. Closing needs `now > end_time`,
//! so at exactly `end_time` a vote is finished but cannot be closed yet.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cc_01_envelope_codec::{
    decode_governance_message, MessageType, ProposalMessage, ProposalResultMessage, VoteMessage,
    VotingAssetWithSlot,
};
use cc_02_proof_verifier::get_account_slot_hash;
use cc_05_receiver::{DestinationHandler, HandlerError};
use parking_lot::Mutex;
use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{to_hex, Address, ChainContext, ChainId, Hash, Timestamp, U256};
use tracing::{debug, info, warn};

use crate::config::VotingMachineConfig;
use crate::domain::{
    BridgedVote, GovernanceError, ProposalVote, ProposalVoteConfiguration, ProposalVoteState,
    Vote, VotingBalanceProof,
};
use crate::ports::MessageForwarder;
use crate::service::voting_strategy::VotingStrategy;

#[derive(Default)]
struct VotingMachineState {
    configurations: HashMap<u64, ProposalVoteConfiguration>,
    configuration_ids: Vec<u64>,
    proposals: HashMap<u64, ProposalVote>,
    votes: HashMap<(u64, Address), Vote>,
    bridged_votes: HashMap<(u64, Address), BridgedVote>,
}

fn vote_state(proposal: Option<&ProposalVote>, now: Timestamp) -> ProposalVoteState {
    match proposal {
        None => ProposalVoteState::NotCreated,
        Some(p) if p.end_time == 0 => ProposalVoteState::NotCreated,
        Some(p) if p.sent_to_governance => ProposalVoteState::SentToGovernance,
        Some(p) if now < p.end_time => ProposalVoteState::Active,
        Some(_) => ProposalVoteState::Finished,
    }
}

/// Voting machine.
pub struct VotingMachine {
    config: VotingMachineConfig,
    ctx: Arc<dyn ChainContext>,
    strategy: VotingStrategy,
    forwarder: Arc<dyn MessageForwarder>,
    events: Arc<dyn EventPublisher>,
    state: Mutex<VotingMachineState>,
}

impl VotingMachine {
    /// Build a voting machine.
    pub fn new(
        config: VotingMachineConfig,
        ctx: Arc<dyn ChainContext>,
        strategy: VotingStrategy,
        forwarder: Arc<dyn MessageForwarder>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            ctx,
            strategy,
            forwarder,
            events,
            state: Mutex::new(VotingMachineState::default()),
        }
    }

    /// Identity on the local controller.
    pub fn address(&self) -> Address {
        self.config.address
    }

    /// Strategy used to weigh proven balances.
    pub fn strategy(&self) -> &VotingStrategy {
        &self.strategy
    }

    // =========================================================================
    // VOTE CREATION
    // =========================================================================

    /// Start voting on a bridged proposal configuration.
    ///
    /// Needs every storage root the strategy reads at the snapshot block.
    pub fn start_proposal_vote(&self, proposal_id: u64) -> Result<ProposalVote, GovernanceError> {
        let configuration = self
            .state
            .lock()
            .configurations
            .get(&proposal_id)
            .copied()
            .ok_or(GovernanceError::MissingProposalConfiguration(proposal_id))?;

        self.strategy
            .has_required_roots(configuration.l1_proposal_block_hash)?;

        let now = self.ctx.now();
        let proposal = {
            let mut state = self.state.lock();
            if state.proposals.contains_key(&proposal_id) {
                return Err(GovernanceError::ProposalVoteAlreadyCreated(proposal_id));
            }
            let proposal = ProposalVote {
                id: proposal_id,
                start_time: now,
                end_time: now + u64::from(configuration.voting_duration),
                creation_block_number: self.ctx.block_number(),
                ..ProposalVote::default()
            };
            state.proposals.insert(proposal_id, proposal);
            proposal
        };

        info!(
            proposal_id,
            start_time = proposal.start_time,
            end_time = proposal.end_time,
            "[cc-07] Proposal vote started"
        );
        self.events.publish(ProtocolEvent::ProposalVoteStarted {
            proposal_id,
            l1_block_hash: configuration.l1_proposal_block_hash,
            start_time: proposal.start_time,
            end_time: proposal.end_time,
        });
        Ok(proposal)
    }

    fn register_vote_configuration(&self, message: ProposalMessage) -> Result<(), GovernanceError> {
        let proposal_id = message.proposal_id;
        {
            let mut state = self.state.lock();
            if state.configurations.contains_key(&proposal_id) {
                return Err(GovernanceError::AlreadyBridged(proposal_id));
            }
            state.configurations.insert(
                proposal_id,
                ProposalVoteConfiguration {
                    voting_duration: message.voting_duration,
                    l1_proposal_block_hash: message.block_hash,
                },
            );
            state.configuration_ids.push(proposal_id);
        }

        let vote_created = match self.start_proposal_vote(proposal_id) {
            Ok(_) => true,
            Err(error) => {
                debug!(proposal_id, %error, "[cc-07] Vote not started on arrival");
                false
            }
        };

        self.events.publish(ProtocolEvent::ProposalVoteConfigurationBridged {
            proposal_id,
            block_hash: message.block_hash,
            voting_duration: message.voting_duration,
            vote_created,
        });
        Ok(())
    }

    // =========================================================================
    // VOTING
    // =========================================================================

    /// Vote directly with storage proofs of the voter's balances.
    ///
    /// Returns the voting power counted.
    pub fn submit_vote(
        &self,
        voter: &Address,
        proposal_id: u64,
        support: bool,
        proofs: &[VotingBalanceProof],
    ) -> Result<U256, GovernanceError> {
        self.cast_vote(voter, proposal_id, support, proofs)
    }

    /// Settle a vote cast through the portal with proofs for exactly the
    /// bridged assets, in the bridged order.
    pub fn settle_vote_from_portal(
        &self,
        proposal_id: u64,
        voter: &Address,
        proofs: &[VotingBalanceProof],
    ) -> Result<U256, GovernanceError> {
        let bridged = self
            .state
            .lock()
            .bridged_votes
            .get(&(proposal_id, *voter))
            .cloned()
            .unwrap_or_default();

        if bridged.voting_assets_with_slot.is_empty()
            || bridged.voting_assets_with_slot.len() != proofs.len()
        {
            return Err(GovernanceError::NoVotingTokens);
        }
        let matches = proofs
            .iter()
            .zip(&bridged.voting_assets_with_slot)
            .all(|(proof, expected)| proof.asset_with_slot() == *expected);
        if !matches {
            return Err(GovernanceError::ProofSetMismatch);
        }

        let power = self.cast_vote(voter, proposal_id, bridged.support, proofs)?;
        self.state.lock().bridged_votes.remove(&(proposal_id, *voter));
        Ok(power)
    }

    fn register_bridged_vote(&self, message: VoteMessage) -> Result<(), GovernanceError> {
        let VoteMessage {
            proposal_id,
            voter,
            support,
            voting_assets_with_slot,
        } = message;

        if voting_assets_with_slot.is_empty() {
            return Err(GovernanceError::NoVotingTokens);
        }

        {
            let now = self.ctx.now();
            let mut state = self.state.lock();
            if vote_state(state.proposals.get(&proposal_id), now) != ProposalVoteState::Active {
                return Err(GovernanceError::VoteNotActive(proposal_id));
            }
            if state.votes.contains_key(&(proposal_id, voter)) {
                return Err(GovernanceError::AlreadyVoted { proposal_id, voter });
            }
            if state.bridged_votes.contains_key(&(proposal_id, voter)) {
                return Err(GovernanceError::VoteAlreadyBridged { proposal_id, voter });
            }
            state.bridged_votes.insert(
                (proposal_id, voter),
                BridgedVote {
                    support,
                    voting_assets_with_slot: voting_assets_with_slot.clone(),
                },
            );
        }

        debug!(proposal_id, voter = %to_hex(&voter), support, "[cc-07] Vote bridged");
        self.events.publish(ProtocolEvent::VoteBridged {
            proposal_id,
            voter,
            support,
            voting_assets_with_slot,
        });
        Ok(())
    }

    fn cast_vote(
        &self,
        voter: &Address,
        proposal_id: u64,
        support: bool,
        proofs: &[VotingBalanceProof],
    ) -> Result<U256, GovernanceError> {
        let now = self.ctx.now();
        let block_hash = {
            let state = self.state.lock();
            if vote_state(state.proposals.get(&proposal_id), now) != ProposalVoteState::Active {
                return Err(GovernanceError::VoteNotActive(proposal_id));
            }
            if state.votes.contains_key(&(proposal_id, *voter)) {
                return Err(GovernanceError::AlreadyVoted {
                    proposal_id,
                    voter: *voter,
                });
            }
            state
                .configurations
                .get(&proposal_id)
                .map(|c| c.l1_proposal_block_hash)
                .ok_or(GovernanceError::MissingProposalConfiguration(proposal_id))?
        };

        let mut seen: HashSet<VotingAssetWithSlot> = HashSet::with_capacity(proofs.len());
        for proof in proofs {
            if !seen.insert(proof.asset_with_slot()) {
                return Err(GovernanceError::VoteOncePerAsset {
                    asset: proof.underlying_asset,
                    slot: proof.slot,
                });
            }
        }

        let mut voting_power = U256::zero();
        for proof in proofs {
            voting_power += self.proven_power(voter, block_hash, proof)?;
        }
        if voting_power.is_zero() {
            return Err(GovernanceError::UserVotingBalanceIsZero);
        }

        {
            let mut state = self.state.lock();
            if state.votes.contains_key(&(proposal_id, *voter)) {
                return Err(GovernanceError::AlreadyVoted {
                    proposal_id,
                    voter: *voter,
                });
            }
            let proposal = state
                .proposals
                .get_mut(&proposal_id)
                .ok_or(GovernanceError::VoteNotActive(proposal_id))?;
            if support {
                proposal.for_votes += voting_power;
            } else {
                proposal.against_votes += voting_power;
            }
            state.votes.insert(
                (proposal_id, *voter),
                Vote {
                    support,
                    voting_power,
                },
            );
        }

        info!(
            proposal_id,
            voter = %to_hex(voter),
            support,
            %voting_power,
            "[cc-07] Vote emitted"
        );
        self.events.publish(ProtocolEvent::VoteEmitted {
            proposal_id,
            voter: *voter,
            support,
            voting_power,
        });
        Ok(voting_power)
    }

    fn proven_power(
        &self,
        voter: &Address,
        block_hash: Hash,
        proof: &VotingBalanceProof,
    ) -> Result<U256, GovernanceError> {
        let asset = proof.underlying_asset;
        if !self.strategy.is_token_slot_accepted(&asset, proof.slot) {
            return Err(GovernanceError::InvalidVotingAsset {
                asset,
                slot: proof.slot,
            });
        }

        let slot_hash = get_account_slot_hash(voter, U256::from(proof.slot));
        let balance = self
            .strategy
            .warehouse()
            .get_storage(asset, block_hash, slot_hash, &proof.proof)?;
        if !balance.exists {
            return Err(GovernanceError::UserBalanceDoesNotExist {
                asset,
                slot: proof.slot,
            });
        }
        if balance.value.is_zero() {
            return Ok(U256::zero());
        }
        self.strategy
            .get_voting_power(&asset, proof.slot, balance.value, block_hash)
    }

    // =========================================================================
    // RESULTS
    // =========================================================================

    /// Close a finished vote and send its totals to the voting portal.
    pub fn close_and_send_vote(&self, proposal_id: u64) -> Result<(), GovernanceError> {
        let now = self.ctx.now();
        let result = {
            let mut state = self.state.lock();
            let proposal = state
                .proposals
                .get_mut(&proposal_id)
                .ok_or(GovernanceError::VoteNotFinished(proposal_id))?;
            if proposal.sent_to_governance {
                return Err(GovernanceError::ResultsAlreadySent(proposal_id));
            }
            if now <= proposal.end_time {
                return Err(GovernanceError::VoteNotFinished(proposal_id));
            }
            proposal.sent_to_governance = true;
            proposal.voting_closed_and_sent_block_number = self.ctx.block_number();
            proposal.voting_closed_and_sent_timestamp = now;
            ProposalResultMessage {
                proposal_id,
                for_votes: proposal.for_votes,
                against_votes: proposal.against_votes,
            }
        };

        if let Err(error) = self.forwarder.forward_message(
            &self.config.address,
            self.config.governance_chain_id,
            self.config.voting_portal,
            self.config.results_gas_limit,
            result.encode(),
        ) {
            warn!(proposal_id, %error, "[cc-07] Sending results failed");
            if let Some(proposal) = self.state.lock().proposals.get_mut(&proposal_id) {
                proposal.sent_to_governance = false;
                proposal.voting_closed_and_sent_block_number = 0;
                proposal.voting_closed_and_sent_timestamp = 0;
            }
            return Err(error);
        }

        info!(
            proposal_id,
            for_votes = %result.for_votes,
            against_votes = %result.against_votes,
            "[cc-07] Proposal results sent"
        );
        self.events.publish(ProtocolEvent::ProposalResultsSent {
            proposal_id,
            for_votes: result.for_votes,
            against_votes: result.against_votes,
        });
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Vote record of a started proposal.
    pub fn get_proposal_by_id(&self, proposal_id: u64) -> Option<ProposalVote> {
        self.state.lock().proposals.get(&proposal_id).copied()
    }

    /// Current vote state.
    pub fn get_proposal_state(&self, proposal_id: u64) -> ProposalVoteState {
        let now = self.ctx.now();
        vote_state(self.state.lock().proposals.get(&proposal_id), now)
    }

    /// Counted vote of `voter`.
    pub fn get_user_proposal_vote(&self, voter: &Address, proposal_id: u64) -> Option<Vote> {
        self.state.lock().votes.get(&(proposal_id, *voter)).copied()
    }

    /// Portal vote of `voter` still waiting for proofs.
    pub fn get_bridged_vote_info(&self, proposal_id: u64, voter: &Address) -> Option<BridgedVote> {
        self.state
            .lock()
            .bridged_votes
            .get(&(proposal_id, *voter))
            .cloned()
    }

    /// Bridged configuration of a proposal.
    pub fn get_proposal_vote_configuration(
        &self,
        proposal_id: u64,
    ) -> Option<ProposalVoteConfiguration> {
        self.state.lock().configurations.get(&proposal_id).copied()
    }

    /// Ids of bridged configurations, latest first.
    pub fn get_proposals_vote_configuration_ids(&self, skip: usize, size: usize) -> Vec<u64> {
        self.state
            .lock()
            .configuration_ids
            .iter()
            .rev()
            .skip(skip)
            .take(size)
            .copied()
            .collect()
    }

    fn publish_message_received(
        &self,
        origin_sender: &Address,
        origin_chain_id: ChainId,
        message_type: u8,
        message: Vec<u8>,
        outcome: Result<(), GovernanceError>,
    ) {
        let (delivered, reason) = match outcome {
            Ok(()) => (true, String::new()),
            Err(error) => {
                warn!(message_type, %error, "[cc-07] Governance message not processed");
                (false, error.to_string())
            }
        };
        self.events.publish(ProtocolEvent::MessageReceived {
            origin_sender: *origin_sender,
            origin_chain_id,
            delivered,
            message_type,
            message,
            reason,
        });
    }
}

impl DestinationHandler for VotingMachine {
    fn receive_cross_chain_message(
        &self,
        origin_sender: &Address,
        origin_chain_id: ChainId,
        message: &[u8],
    ) -> Result<(), HandlerError> {
        if origin_chain_id != self.config.governance_chain_id
            || *origin_sender != self.config.voting_portal
        {
            return Err(HandlerError::new(GovernanceError::WrongMessageOrigin {
                sender: *origin_sender,
                chain_id: origin_chain_id,
            }));
        }

        let decoded = decode_governance_message(message).and_then(|(tag, inner)| {
            MessageType::try_from(tag).map(|message_type| (tag, message_type, inner))
        });
        let (tag, message_type, inner) = match decoded {
            Ok(parts) => parts,
            Err(error) => {
                warn!(%error, "[cc-07] Incorrect message type");
                self.events.publish(ProtocolEvent::IncorrectTypeMessageReceived {
                    origin_sender: *origin_sender,
                    origin_chain_id,
                    message: message.to_vec(),
                    reason: error.to_string(),
                });
                return Ok(());
            }
        };

        // Undecodable bodies are consumed; a decoded message that cannot be
        // applied fails the delivery so the envelope stays retryable.
        let applied = match message_type {
            MessageType::Proposal => ProposalMessage::decode(&inner)
                .map_err(GovernanceError::from)
                .map(|proposal| self.register_vote_configuration(proposal)),
            MessageType::Vote => VoteMessage::decode(&inner)
                .map_err(GovernanceError::from)
                .map(|vote| self.register_bridged_vote(vote)),
            MessageType::Null => Err(GovernanceError::UnsupportedMessageType),
        };
        match applied {
            Ok(Err(error)) => {
                warn!(message_type = tag, %error, "[cc-07] Governance message rejected");
                Err(HandlerError::new(error))
            }
            Ok(Ok(())) => {
                self.publish_message_received(origin_sender, origin_chain_id, tag, inner, Ok(()));
                Ok(())
            }
            Err(error) => {
                self.publish_message_received(origin_sender, origin_chain_id, tag, inner, Err(error));
                Ok(())
            }
        }
    }
}
