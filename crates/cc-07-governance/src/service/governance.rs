//! # Governance Core
//!
//! Proposal lifecycle on the governance chain.
//!
//! ```text
//! Created --activate--> Active --results--> Queued --execute--> Executed
//!    |                    |          \--> Failed
//!    +------cancel--------+----cancel----+--> Cancelled
//! ```
//!
//! Created, Active and Queued proposals read as Expired once older than the
//! expiration time. Votes are counted on the voting chain; governance only
//! sees the totals, delivered by the proposal's voting portal.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cc_01_envelope_codec::{PayloadExecutionMessage, VotingAssetWithSlot};
use parking_lot::{Mutex, RwLock};
use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{
    is_zero_address, to_hex, AccessControl, Address, ChainContext, Hash, Timestamp, U256, ZERO_HASH,
};
use tracing::{debug, info, warn};

use crate::config::{GovernanceConfig, VotingConfig};
use crate::domain::{AccessLevel, GovernanceError, Payload, Proposal, ProposalState};
use crate::ports::{MessageForwarder, PropositionPowerStrategy, VotingPortalPort};

/// Largest voting duration a start-voting message can carry (uint24).
const MAX_VOTING_DURATION: u32 = (1 << 24) - 1;

/// Governance core.
pub struct Governance {
    config: GovernanceConfig,
    access: AccessControl,
    ctx: Arc<dyn ChainContext>,
    forwarder: Arc<dyn MessageForwarder>,
    events: Arc<dyn EventPublisher>,
    power_strategy: RwLock<Arc<dyn PropositionPowerStrategy>>,
    voting_configs: RwLock<HashMap<AccessLevel, VotingConfig>>,
    approved_portals: RwLock<HashSet<Address>>,
    portal_book: RwLock<HashMap<Address, Arc<dyn VotingPortalPort>>>,
    proposals: Mutex<Vec<Proposal>>,
}

impl Governance {
    /// Build governance with the voting configs from `config`.
    pub fn new(
        config: GovernanceConfig,
        ctx: Arc<dyn ChainContext>,
        forwarder: Arc<dyn MessageForwarder>,
        power_strategy: Arc<dyn PropositionPowerStrategy>,
        events: Arc<dyn EventPublisher>,
    ) -> Result<Self, GovernanceError> {
        let governance = Self {
            access: AccessControl::new(config.owner, config.guardian),
            ctx,
            forwarder,
            events,
            power_strategy: RwLock::new(Arc::clone(&power_strategy)),
            voting_configs: RwLock::new(HashMap::new()),
            approved_portals: RwLock::new(HashSet::new()),
            portal_book: RwLock::new(HashMap::new()),
            proposals: Mutex::new(Vec::new()),
            config,
        };
        let initial = governance.config.voting_configs.clone();
        governance.apply_voting_configs(&initial)?;
        governance.events.publish(ProtocolEvent::PowerStrategyUpdated {
            new_power_strategy: power_strategy.address(),
        });
        info!(
            address = %to_hex(&governance.config.address),
            levels = initial.len(),
            "[cc-07] Governance initialised"
        );
        Ok(governance)
    }

    /// Identity on the local controller.
    pub fn address(&self) -> Address {
        self.config.address
    }

    /// Bind the implementation behind an approved portal address.
    pub fn bind_voting_portal(&self, address: Address, portal: Arc<dyn VotingPortalPort>) {
        self.portal_book.write().insert(address, portal);
    }

    // =========================================================================
    // PROPOSAL LIFECYCLE
    // =========================================================================

    /// Create a proposal. Returns its id.
    pub fn create_proposal(
        &self,
        creator: &Address,
        payloads: Vec<Payload>,
        voting_portal: Address,
        ipfs_hash: Hash,
    ) -> Result<u64, GovernanceError> {
        if payloads.is_empty() {
            return Err(GovernanceError::AtLeastOnePayload);
        }
        if !self.is_voting_portal_approved(&voting_portal) {
            return Err(GovernanceError::VotingPortalNotApproved(voting_portal));
        }

        let mut access_level = AccessLevel::Null;
        for payload in &payloads {
            if payload.access_level == AccessLevel::Null {
                return Err(GovernanceError::InvalidPayloadAccessLevel(payload.payload_id));
            }
            access_level = access_level.max(payload.access_level);
        }

        let voting_config = self
            .get_voting_config(access_level)
            .ok_or(GovernanceError::VotingConfigNotSet(access_level.into()))?;
        self.require_proposition_power(creator, &voting_config)?;

        let now = self.ctx.now();
        let proposal_id = {
            let mut proposals = self.proposals.lock();
            let proposal_id = proposals.len() as u64;
            proposals.push(Proposal {
                state: ProposalState::Created,
                access_level,
                creator: *creator,
                voting_duration: voting_config.voting_duration,
                creation_time: now,
                voting_activation_time: 0,
                queuing_time: 0,
                cancel_timestamp: 0,
                voting_portal,
                snapshot_block_hash: ZERO_HASH,
                ipfs_hash,
                for_votes: U256::zero(),
                against_votes: U256::zero(),
                payloads,
            });
            proposal_id
        };

        info!(
            proposal_id,
            creator = %to_hex(creator),
            ?access_level,
            "[cc-07] Proposal created"
        );
        self.events.publish(ProtocolEvent::ProposalCreated {
            proposal_id,
            creator: *creator,
            access_level: access_level.into(),
            ipfs_hash,
        });
        Ok(proposal_id)
    }

    /// Open voting: take the snapshot block and tell the voting chain.
    pub fn activate_voting(&self, proposal_id: u64) -> Result<(), GovernanceError> {
        let now = self.ctx.now();
        let proposal = self
            .proposal_in_state(proposal_id, ProposalState::Created, now)
            .map_err(|_| GovernanceError::ProposalNotInCreatedState(proposal_id))?;

        let voting_config = self
            .get_voting_config(proposal.access_level)
            .ok_or(GovernanceError::VotingConfigNotSet(proposal.access_level.into()))?;
        if now - proposal.creation_time <= voting_config.cooldown_before_voting_start {
            return Err(GovernanceError::VotingStartCooldownNotPassed(proposal_id));
        }
        if !self.is_voting_portal_approved(&proposal.voting_portal) {
            return Err(GovernanceError::VotingPortalNotApproved(proposal.voting_portal));
        }
        self.require_proposition_power(&proposal.creator, &voting_config)?;
        let portal = self.portal(&proposal.voting_portal)?;

        let snapshot_block_hash = self.ctx.latest_block_hash();
        let voting_duration = voting_config.voting_duration;
        self.update_proposal(proposal_id, |p| {
            p.state = ProposalState::Active;
            p.voting_activation_time = now;
            p.snapshot_block_hash = snapshot_block_hash;
            p.voting_duration = voting_duration;
        });

        if let Err(error) = portal.forward_start_voting_message(
            &self.config.address,
            proposal_id,
            snapshot_block_hash,
            voting_duration,
        ) {
            warn!(proposal_id, %error, "[cc-07] Start voting message not forwarded");
            self.update_proposal(proposal_id, |p| {
                p.state = ProposalState::Created;
                p.voting_activation_time = 0;
                p.snapshot_block_hash = ZERO_HASH;
            });
            return Err(error);
        }

        info!(
            proposal_id,
            snapshot_block_hash = %to_hex(&snapshot_block_hash),
            voting_duration,
            "[cc-07] Voting activated"
        );
        self.events.publish(ProtocolEvent::VotingActivated {
            proposal_id,
            snapshot_block_hash,
            voting_duration,
        });
        Ok(())
    }

    /// Vote from the governance chain. The vote is settled with proofs on
    /// the voting chain.
    pub fn vote_via_portal(
        &self,
        voter: &Address,
        proposal_id: u64,
        support: bool,
        voting_assets_with_slot: &[VotingAssetWithSlot],
    ) -> Result<(), GovernanceError> {
        let now = self.ctx.now();
        let proposal = self
            .proposal_in_state(proposal_id, ProposalState::Active, now)
            .map_err(|_| GovernanceError::ProposalNotInActiveState(proposal_id))?;

        let count = voting_assets_with_slot.len();
        if count == 0 || count > self.config.voting_tokens_cap {
            return Err(GovernanceError::InvalidVotingTokens {
                count,
                cap: self.config.voting_tokens_cap,
            });
        }

        self.portal(&proposal.voting_portal)?.forward_vote_message(
            &self.config.address,
            proposal_id,
            voter,
            support,
            voting_assets_with_slot,
        )?;

        debug!(proposal_id, voter = %to_hex(voter), support, "[cc-07] Vote forwarded");
        self.events.publish(ProtocolEvent::VoteForwarded {
            proposal_id,
            voter: *voter,
            support,
            voting_assets_with_slot: voting_assets_with_slot.to_vec(),
        });
        Ok(())
    }

    /// Record the totals sent back by the proposal's voting portal and
    /// settle the proposal as queued or failed.
    pub fn queue_proposal(
        &self,
        caller: &Address,
        proposal_id: u64,
        for_votes: U256,
        against_votes: U256,
    ) -> Result<ProposalState, GovernanceError> {
        let now = self.ctx.now();
        let proposal = self
            .proposal_in_state(proposal_id, ProposalState::Active, now)
            .map_err(|_| GovernanceError::ProposalNotInActiveState(proposal_id))?;

        if *caller != proposal.voting_portal || !self.is_voting_portal_approved(caller) {
            return Err(GovernanceError::CallerNotValidVotingPortal(*caller));
        }
        if now < proposal.voting_activation_time + u64::from(proposal.voting_duration) {
            return Err(GovernanceError::VotingDurationNotPassed(proposal_id));
        }

        let voting_config = self
            .get_voting_config(proposal.access_level)
            .ok_or(GovernanceError::VotingConfigNotSet(proposal.access_level.into()))?;
        let passed = for_votes >= voting_config.yes_threshold
            && for_votes >= against_votes
            && for_votes - against_votes >= voting_config.yes_no_differential;

        let state = if passed {
            ProposalState::Queued
        } else {
            ProposalState::Failed
        };
        self.update_proposal(proposal_id, |p| {
            p.for_votes = for_votes;
            p.against_votes = against_votes;
            p.state = state;
            if passed {
                p.queuing_time = now;
            }
        });

        info!(proposal_id, ?state, %for_votes, %against_votes, "[cc-07] Proposal results recorded");
        let event = if passed {
            ProtocolEvent::ProposalQueued {
                proposal_id,
                votes_for: for_votes,
                votes_against: against_votes,
            }
        } else {
            ProtocolEvent::ProposalFailed {
                proposal_id,
                votes_for: for_votes,
                votes_against: against_votes,
            }
        };
        self.events.publish(event);
        Ok(state)
    }

    /// Send one execution message per payload.
    ///
    /// Needs the queue cooldown to have passed and the creator to still
    /// hold the level's proposition power. Every payload's route is checked
    /// before the first one is sent, so an unroutable payload sends nothing
    /// and the proposal stays queued.
    pub fn execute_proposal(&self, proposal_id: u64) -> Result<(), GovernanceError> {
        let now = self.ctx.now();
        let proposal = self
            .proposal_in_state(proposal_id, ProposalState::Queued, now)
            .map_err(|_| GovernanceError::ProposalNotInQueuedState(proposal_id))?;
        if now < proposal.queuing_time + self.config.cooldown_period {
            return Err(GovernanceError::QueueCooldownNotPassed(proposal_id));
        }
        let voting_config = self
            .get_voting_config(proposal.access_level)
            .ok_or(GovernanceError::VotingConfigNotSet(proposal.access_level.into()))?;
        self.require_proposition_power(&proposal.creator, &voting_config)?;
        for payload in &proposal.payloads {
            self.forwarder
                .check_route(&self.config.address, payload.chain)
                .inspect_err(|error| {
                    warn!(proposal_id, payload_id = payload.payload_id, %error, "[cc-07] Payload unroutable");
                })?;
        }

        self.update_proposal(proposal_id, |p| p.state = ProposalState::Executed);

        let total = proposal.payloads.len();
        let mut sent = Vec::with_capacity(total);
        for (index, payload) in proposal.payloads.iter().enumerate() {
            let message = PayloadExecutionMessage {
                payload_id: payload.payload_id,
            };
            if let Err(error) = self.forwarder.forward_message(
                &self.config.address,
                payload.chain,
                payload.payloads_controller,
                self.config.execution_gas_limit,
                message.encode(),
            ) {
                warn!(proposal_id, payload_id = payload.payload_id, %error, "[cc-07] Payload not sent");
                self.update_proposal(proposal_id, |p| p.state = ProposalState::Queued);
                return Err(error);
            }
            sent.push(ProtocolEvent::PayloadSent {
                proposal_id,
                payload_id: payload.payload_id,
                payloads_controller: payload.payloads_controller,
                chain_id: payload.chain,
                payload_number_on_proposal: index,
                number_of_payloads_on_proposal: total,
            });
        }

        for event in sent {
            self.events.publish(event);
        }
        info!(proposal_id, payloads = total, "[cc-07] Proposal executed");
        self.events.publish(ProtocolEvent::ProposalExecuted { proposal_id });
        Ok(())
    }

    /// Cancel a proposal that has not been executed.
    ///
    /// The guardian may always cancel, the creator only before activation,
    /// and anyone once the creator's proposition power fell below the
    /// level minimum.
    pub fn cancel_proposal(&self, caller: &Address, proposal_id: u64) -> Result<(), GovernanceError> {
        let now = self.ctx.now();
        let proposal = self
            .get_proposal(proposal_id)
            .ok_or(GovernanceError::ProposalNotInCorrectState(proposal_id))?;
        let state = self.effective_state(&proposal, now);
        if !matches!(
            state,
            ProposalState::Created | ProposalState::Active | ProposalState::Queued
        ) {
            return Err(GovernanceError::ProposalNotInCorrectState(proposal_id));
        }

        let privileged = *caller == self.access.guardian
            || (*caller == proposal.creator && state == ProposalState::Created);
        if !privileged {
            let voting_config = self
                .get_voting_config(proposal.access_level)
                .ok_or(GovernanceError::VotingConfigNotSet(proposal.access_level.into()))?;
            if self.require_proposition_power(&proposal.creator, &voting_config).is_ok() {
                return Err(GovernanceError::CallerCannotCancel {
                    proposal_id,
                    caller: *caller,
                });
            }
        }

        self.update_proposal(proposal_id, |p| {
            p.state = ProposalState::Cancelled;
            p.cancel_timestamp = now;
        });
        info!(proposal_id, caller = %to_hex(caller), "[cc-07] Proposal cancelled");
        self.events.publish(ProtocolEvent::ProposalCanceled { proposal_id });
        Ok(())
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Approve voting portals (owner only).
    pub fn add_voting_portals(
        &self,
        caller: &Address,
        portals: &[Address],
    ) -> Result<(), GovernanceError> {
        self.access.only_owner(caller)?;
        self.approve_portals(portals)
    }

    /// Revoke voting portals (owner only). Unknown portals are ignored.
    pub fn remove_voting_portals(
        &self,
        caller: &Address,
        portals: &[Address],
    ) -> Result<(), GovernanceError> {
        self.access.only_owner(caller)?;
        for portal in portals {
            if self.approved_portals.write().remove(portal) {
                self.events.publish(ProtocolEvent::VotingPortalUpdated {
                    voting_portal: *portal,
                    approved: false,
                });
            }
        }
        Ok(())
    }

    /// Approve a portal after every portal was removed (guardian only).
    pub fn rescue_voting_portal(
        &self,
        caller: &Address,
        portal: Address,
    ) -> Result<(), GovernanceError> {
        self.access.only_guardian(caller)?;
        if self.get_voting_portals_count() != 0 {
            return Err(GovernanceError::VotingPortalsCountNotZero);
        }
        warn!(portal = %to_hex(&portal), "[cc-07] Voting portal rescued");
        self.approve_portals(&[portal])
    }

    /// Replace the proposition power strategy (owner only).
    pub fn set_power_strategy(
        &self,
        caller: &Address,
        strategy: Arc<dyn PropositionPowerStrategy>,
    ) -> Result<(), GovernanceError> {
        self.access.only_owner(caller)?;
        let address = strategy.address();
        *self.power_strategy.write() = strategy;
        self.events.publish(ProtocolEvent::PowerStrategyUpdated {
            new_power_strategy: address,
        });
        Ok(())
    }

    /// Set voting rules per access level (owner only).
    pub fn set_voting_configs(
        &self,
        caller: &Address,
        configs: &[VotingConfig],
    ) -> Result<(), GovernanceError> {
        self.access.only_owner(caller)?;
        self.apply_voting_configs(configs)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Stored proposal record.
    pub fn get_proposal(&self, proposal_id: u64) -> Option<Proposal> {
        usize::try_from(proposal_id)
            .ok()
            .and_then(|index| self.proposals.lock().get(index).cloned())
    }

    /// Proposal state with expiry applied.
    pub fn get_proposal_state(&self, proposal_id: u64) -> ProposalState {
        let now = self.ctx.now();
        self.get_proposal(proposal_id)
            .map(|p| self.effective_state(&p, now))
            .unwrap_or_default()
    }

    /// Number of proposals ever created.
    pub fn get_proposals_count(&self) -> u64 {
        self.proposals.lock().len() as u64
    }

    /// Number of approved portals.
    pub fn get_voting_portals_count(&self) -> usize {
        self.approved_portals.read().len()
    }

    /// Whether `portal` is approved.
    pub fn is_voting_portal_approved(&self, portal: &Address) -> bool {
        self.approved_portals.read().contains(portal)
    }

    /// Voting rules for `access_level`.
    pub fn get_voting_config(&self, access_level: AccessLevel) -> Option<VotingConfig> {
        self.voting_configs.read().get(&access_level).copied()
    }

    /// Address of the proposition power strategy.
    pub fn get_power_strategy(&self) -> Address {
        self.power_strategy.read().address()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn effective_state(&self, proposal: &Proposal, now: Timestamp) -> ProposalState {
        let live = matches!(
            proposal.state,
            ProposalState::Created | ProposalState::Active | ProposalState::Queued
        );
        if live && now > proposal.creation_time + self.config.proposal_expiration_time {
            ProposalState::Expired
        } else {
            proposal.state
        }
    }

    fn proposal_in_state(
        &self,
        proposal_id: u64,
        expected: ProposalState,
        now: Timestamp,
    ) -> Result<Proposal, ProposalState> {
        let proposal = self.get_proposal(proposal_id).ok_or(ProposalState::Null)?;
        let state = self.effective_state(&proposal, now);
        if state != expected {
            return Err(state);
        }
        Ok(proposal)
    }

    fn update_proposal(&self, proposal_id: u64, update: impl FnOnce(&mut Proposal)) {
        let Ok(index) = usize::try_from(proposal_id) else {
            return;
        };
        if let Some(proposal) = self.proposals.lock().get_mut(index) {
            update(proposal);
        }
    }

    fn require_proposition_power(
        &self,
        creator: &Address,
        voting_config: &VotingConfig,
    ) -> Result<(), GovernanceError> {
        let strategy = Arc::clone(&*self.power_strategy.read());
        let actual = strategy.get_full_proposition_power(creator);
        if actual < voting_config.min_proposition_power {
            return Err(GovernanceError::PropositionPowerTooLow {
                required: voting_config.min_proposition_power,
                actual,
            });
        }
        Ok(())
    }

    fn portal(&self, address: &Address) -> Result<Arc<dyn VotingPortalPort>, GovernanceError> {
        self.portal_book
            .read()
            .get(address)
            .cloned()
            .ok_or(GovernanceError::VotingPortalNotBound(*address))
    }

    fn approve_portals(&self, portals: &[Address]) -> Result<(), GovernanceError> {
        if portals.iter().any(is_zero_address) {
            return Err(GovernanceError::InvalidVotingPortalAddress);
        }
        for portal in portals {
            if self.approved_portals.write().insert(*portal) {
                info!(portal = %to_hex(portal), "[cc-07] Voting portal approved");
                self.events.publish(ProtocolEvent::VotingPortalUpdated {
                    voting_portal: *portal,
                    approved: true,
                });
            }
        }
        Ok(())
    }

    fn apply_voting_configs(&self, configs: &[VotingConfig]) -> Result<(), GovernanceError> {
        for config in configs {
            let level: u8 = config.access_level.into();
            if config.access_level == AccessLevel::Null
                || config.voting_duration == 0
                || config.voting_duration > MAX_VOTING_DURATION
                || config.cooldown_before_voting_start + u64::from(config.voting_duration)
                    >= self.config.proposal_expiration_time
            {
                return Err(GovernanceError::InvalidVotingConfig(level));
            }
        }

        let mut voting_configs = self.voting_configs.write();
        for config in configs {
            voting_configs.insert(config.access_level, *config);
            self.events.publish(ProtocolEvent::VotingConfigUpdated {
                access_level: config.access_level.into(),
                voting_duration: config.voting_duration,
                cooldown_before_voting_start: config.cooldown_before_voting_start,
                yes_threshold: config.yes_threshold,
                yes_no_differential: config.yes_no_differential,
                min_proposition_power: config.min_proposition_power,
            });
        }
        Ok(())
    }
}
