//! # Voting Portal
//!
//! Connects governance to one voting machine on one voting chain. Outbound
//! it forwards start-voting messages and votes; inbound it takes results
//! and queues the proposal as the portal.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use cc_01_envelope_codec::{ProposalMessage, ProposalResultMessage, VoteMessage, VotingAssetWithSlot};
use cc_05_receiver::{DestinationHandler, HandlerError};
use parking_lot::Mutex;
use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{to_hex, Address, ChainId, Hash};
use tracing::{debug, info, warn};

use crate::config::VotingPortalConfig;
use crate::domain::GovernanceError;
use crate::ports::{MessageForwarder, VotingPortalPort};
use crate::service::governance::Governance;

/// Voting portal.
pub struct VotingPortal {
    config: VotingPortalConfig,
    governance: Weak<Governance>,
    forwarder: Arc<dyn MessageForwarder>,
    events: Arc<dyn EventPublisher>,
    voted: Mutex<HashSet<(u64, Address)>>,
}

impl VotingPortal {
    /// Portal serving `governance`.
    pub fn new(
        config: VotingPortalConfig,
        governance: &Arc<Governance>,
        forwarder: Arc<dyn MessageForwarder>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            governance: Arc::downgrade(governance),
            forwarder,
            events,
            voted: Mutex::new(HashSet::new()),
        }
    }

    /// Identity on the local controller.
    pub fn address(&self) -> Address {
        self.config.address
    }

    /// Chain the voting machine lives on.
    pub fn voting_machine_chain_id(&self) -> ChainId {
        self.config.voting_machine_chain_id
    }

    /// Whether a vote of `voter` on `proposal_id` went through this portal.
    pub fn did_voter_vote_on_proposal(&self, proposal_id: u64, voter: &Address) -> bool {
        self.voted.lock().contains(&(proposal_id, *voter))
    }

    fn only_governance(&self, caller: &Address) -> Result<(), GovernanceError> {
        if *caller != self.config.governance {
            return Err(GovernanceError::CallerNotGovernance(*caller));
        }
        Ok(())
    }

    fn publish_received(
        &self,
        origin_sender: &Address,
        origin_chain_id: ChainId,
        message: &[u8],
        failure: Option<String>,
    ) {
        self.events.publish(ProtocolEvent::VoteMessageReceived {
            origin_sender: *origin_sender,
            origin_chain_id,
            delivered: failure.is_none(),
            message: message.to_vec(),
            reason: failure.unwrap_or_default(),
        });
    }

    fn forward(&self, gas_limit: u64, message: Vec<u8>) -> Result<Hash, GovernanceError> {
        self.forwarder.forward_message(
            &self.config.address,
            self.config.voting_machine_chain_id,
            self.config.voting_machine,
            gas_limit,
            message,
        )
    }
}

impl VotingPortalPort for VotingPortal {
    fn forward_start_voting_message(
        &self,
        caller: &Address,
        proposal_id: u64,
        block_hash: Hash,
        voting_duration: u32,
    ) -> Result<(), GovernanceError> {
        self.only_governance(caller)?;
        let message = ProposalMessage {
            proposal_id,
            block_hash,
            voting_duration,
        };
        self.forward(self.config.start_voting_gas_limit, message.encode_tagged())?;
        debug!(proposal_id, "[cc-07] Start voting message forwarded");
        Ok(())
    }

    fn forward_vote_message(
        &self,
        caller: &Address,
        proposal_id: u64,
        voter: &Address,
        support: bool,
        voting_assets_with_slot: &[VotingAssetWithSlot],
    ) -> Result<(), GovernanceError> {
        self.only_governance(caller)?;
        if !self.voted.lock().insert((proposal_id, *voter)) {
            return Err(GovernanceError::VoterAlreadyVotedOnProposal {
                proposal_id,
                voter: *voter,
            });
        }

        let message = VoteMessage {
            proposal_id,
            voter: *voter,
            support,
            voting_assets_with_slot: voting_assets_with_slot.to_vec(),
        };
        if let Err(error) = self.forward(self.config.vote_via_portal_gas_limit, message.encode_tagged())
        {
            self.voted.lock().remove(&(proposal_id, *voter));
            return Err(error);
        }
        debug!(proposal_id, voter = %to_hex(voter), "[cc-07] Vote message forwarded");
        Ok(())
    }
}

impl DestinationHandler for VotingPortal {
    /// Results that cannot be decoded are reported and consumed. A refused
    /// queue is an error so the envelope stays retryable.
    fn receive_cross_chain_message(
        &self,
        origin_sender: &Address,
        origin_chain_id: ChainId,
        message: &[u8],
    ) -> Result<(), HandlerError> {
        if *origin_sender != self.config.voting_machine
            || origin_chain_id != self.config.voting_machine_chain_id
        {
            return Err(HandlerError::new(GovernanceError::WrongMessageOrigin {
                sender: *origin_sender,
                chain_id: origin_chain_id,
            }));
        }

        let result = match ProposalResultMessage::decode(message) {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "[cc-07] Undecodable vote results");
                self.publish_received(origin_sender, origin_chain_id, message, Some(error.to_string()));
                return Ok(());
            }
        };

        let governance = self
            .governance
            .upgrade()
            .ok_or_else(|| HandlerError::new("governance is gone"))?;
        governance
            .queue_proposal(
                &self.config.address,
                result.proposal_id,
                result.for_votes,
                result.against_votes,
            )
            .map_err(|error| {
                warn!(proposal_id = result.proposal_id, %error, "[cc-07] Governance refused the results");
                HandlerError::new(error)
            })?;

        info!(proposal_id = result.proposal_id, "[cc-07] Vote results received");
        self.publish_received(origin_sender, origin_chain_id, message, None);
        Ok(())
    }
}
