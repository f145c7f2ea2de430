//! # Protocol Events
//!
//! All events published by the cross-chain subsystems.

use cc_01_envelope_codec::{Envelope, VotingAssetWithSlot};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId, Hash, Timestamp};

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
    // =========================================================================
    // REGISTRY
    // =========================================================================
    /// A sender was approved or removed.
    SenderUpdated {
        /// Sender address.
        sender: Address,
        /// New approval flag.
        is_approved: bool,
    },

    /// A forwarder adapter pair was enabled or disabled.
    BridgeAdapterUpdated {
        /// Destination chain of the pair.
        destination_chain_id: ChainId,
        /// Adapter on this chain.
        bridge_adapter: Address,
        /// Adapter on the destination chain.
        destination_bridge_adapter: Address,
        /// Enabled or disabled.
        allowed: bool,
    },

    /// A receiver adapter was allowed or disallowed for a chain.
    ReceiverBridgeAdaptersUpdated {
        /// Adapter address.
        bridge_adapter: Address,
        /// Allowed or disallowed.
        allowed: bool,
        /// Origin chain.
        chain_id: ChainId,
    },

    /// Required confirmations changed for a chain.
    ConfirmationsUpdated {
        /// New threshold.
        new_confirmations: u8,
        /// Origin chain.
        chain_id: ChainId,
    },

    /// Invalidation watermark changed for a chain.
    NewInvalidation {
        /// New watermark.
        invalid_timestamp: Timestamp,
        /// Origin chain.
        chain_id: ChainId,
    },

    // =========================================================================
    // FORWARDER
    // =========================================================================
    /// A new envelope was registered.
    EnvelopeRegistered {
        /// Envelope id.
        envelope_id: Hash,
        /// The envelope.
        envelope: Envelope,
    },

    /// One adapter attempted to send a transaction.
    TransactionForwardingAttempted {
        /// Transaction id.
        transaction_id: Hash,
        /// Wrapped envelope id.
        envelope_id: Hash,
        /// Encoded transaction.
        encoded_transaction: Vec<u8>,
        /// Destination chain.
        destination_chain_id: ChainId,
        /// Adapter on this chain.
        bridge_adapter: Address,
        /// Adapter on the destination chain.
        destination_bridge_adapter: Address,
        /// Whether the adapter accepted the send.
        adapter_successful: bool,
        /// Adapter return data (error reason on failure).
        return_data: Vec<u8>,
    },

    // =========================================================================
    // RECEIVER
    // =========================================================================
    /// An adapter confirmed a transaction.
    TransactionReceived {
        /// Transaction id.
        transaction_id: Hash,
        /// Wrapped envelope id.
        envelope_id: Hash,
        /// Origin chain.
        origin_chain_id: ChainId,
        /// Encoded transaction.
        transaction: Vec<u8>,
        /// Confirming adapter.
        bridge_adapter: Address,
        /// Confirmations after this one.
        confirmations: u8,
    },

    /// Delivery of a confirmed envelope was attempted.
    EnvelopeDeliveryAttempted {
        /// Envelope id.
        envelope_id: Hash,
        /// The envelope.
        envelope: Envelope,
        /// Whether the destination accepted it.
        is_delivered: bool,
    },

    // =========================================================================
    // EMERGENCY
    // =========================================================================
    /// A chain entered a new emergency.
    NetworkEmergencyStateUpdated {
        /// Chain in emergency.
        chain_id: ChainId,
        /// Emergency count after the update.
        emergency_number: u64,
    },

    /// The guardian solved an emergency.
    EmergencySolved {
        /// Emergency count now acknowledged.
        emergency_count: u64,
    },

    /// The emergency oracle was replaced.
    EmergencyOracleUpdated {
        /// New oracle address.
        emergency_oracle: Address,
    },

    // =========================================================================
    // PROOF VERIFIER
    // =========================================================================
    /// A storage root was proven and stored.
    StorageRootProcessed {
        /// Caller.
        caller: Address,
        /// Account whose root was stored.
        account: Address,
        /// Block the proof is anchored to.
        block_hash: Hash,
    },

    /// A storage slot was proven and cached.
    StorageSlotProcessed {
        /// Caller.
        caller: Address,
        /// Account holding the slot.
        account: Address,
        /// Block the proof is anchored to.
        block_hash: Hash,
        /// Slot key.
        slot: Hash,
        /// Slot value.
        value: U256,
    },

    // =========================================================================
    // VOTING MACHINE
    // =========================================================================
    /// Voting opened on a voting chain.
    ProposalVoteStarted {
        /// Proposal id.
        proposal_id: u64,
        /// Governance-chain snapshot block.
        l1_block_hash: Hash,
        /// Voting start.
        start_time: Timestamp,
        /// Voting end.
        end_time: Timestamp,
    },

    /// A proposal vote configuration arrived from governance.
    ProposalVoteConfigurationBridged {
        /// Proposal id.
        proposal_id: u64,
        /// Snapshot block.
        block_hash: Hash,
        /// Voting duration.
        voting_duration: u32,
        /// Whether voting started immediately.
        vote_created: bool,
    },

    /// A vote cast on the governance chain arrived for settlement.
    VoteBridged {
        /// Proposal id.
        proposal_id: u64,
        /// Voter.
        voter: Address,
        /// Support.
        support: bool,
        /// Assets to prove.
        voting_assets_with_slot: Vec<VotingAssetWithSlot>,
    },

    /// A vote was counted.
    VoteEmitted {
        /// Proposal id.
        proposal_id: u64,
        /// Voter.
        voter: Address,
        /// Support.
        support: bool,
        /// Weighted voting power.
        voting_power: U256,
    },

    /// Results were sent back to governance.
    ProposalResultsSent {
        /// Proposal id.
        proposal_id: u64,
        /// For votes.
        for_votes: U256,
        /// Against votes.
        against_votes: U256,
    },

    /// A governance message was processed (or failed to be).
    MessageReceived {
        /// Sender on the origin chain.
        origin_sender: Address,
        /// Origin chain.
        origin_chain_id: ChainId,
        /// Whether processing succeeded.
        delivered: bool,
        /// Raw message type tag.
        message_type: u8,
        /// Inner message bytes.
        message: Vec<u8>,
        /// Failure reason, empty on success.
        reason: String,
    },

    /// A message whose type tag could not be decoded.
    IncorrectTypeMessageReceived {
        /// Sender on the origin chain.
        origin_sender: Address,
        /// Origin chain.
        origin_chain_id: ChainId,
        /// Raw message.
        message: Vec<u8>,
        /// Decoding failure.
        reason: String,
    },

    // =========================================================================
    // GOVERNANCE
    // =========================================================================
    /// A proposal was created.
    ProposalCreated {
        /// Proposal id.
        proposal_id: u64,
        /// Creator.
        creator: Address,
        /// Highest payload access level.
        access_level: u8,
        /// IPFS hash of the description.
        ipfs_hash: Hash,
    },

    /// Voting was activated for a proposal.
    VotingActivated {
        /// Proposal id.
        proposal_id: u64,
        /// Snapshot block hash.
        snapshot_block_hash: Hash,
        /// Voting duration.
        voting_duration: u32,
    },

    /// A vote was forwarded to a voting chain.
    VoteForwarded {
        /// Proposal id.
        proposal_id: u64,
        /// Voter.
        voter: Address,
        /// Support.
        support: bool,
        /// Assets to prove on the voting chain.
        voting_assets_with_slot: Vec<VotingAssetWithSlot>,
    },

    /// A proposal passed and was queued.
    ProposalQueued {
        /// Proposal id.
        proposal_id: u64,
        /// For votes.
        votes_for: U256,
        /// Against votes.
        votes_against: U256,
    },

    /// A proposal did not pass.
    ProposalFailed {
        /// Proposal id.
        proposal_id: u64,
        /// For votes.
        votes_for: U256,
        /// Against votes.
        votes_against: U256,
    },

    /// A payload execution message was sent.
    PayloadSent {
        /// Proposal id.
        proposal_id: u64,
        /// Payload id.
        payload_id: u64,
        /// Payloads controller on the target chain.
        payloads_controller: Address,
        /// Target chain.
        chain_id: ChainId,
        /// Index within the proposal.
        payload_number_on_proposal: usize,
        /// Payload count.
        number_of_payloads_on_proposal: usize,
    },

    /// A proposal was executed.
    ProposalExecuted {
        /// Proposal id.
        proposal_id: u64,
    },

    /// A proposal was cancelled.
    ProposalCanceled {
        /// Proposal id.
        proposal_id: u64,
    },

    /// A voting portal was approved or removed.
    VotingPortalUpdated {
        /// Portal address.
        voting_portal: Address,
        /// Approval flag.
        approved: bool,
    },

    /// The proposition power strategy was replaced.
    PowerStrategyUpdated {
        /// Strategy address.
        new_power_strategy: Address,
    },

    /// A voting configuration was set.
    VotingConfigUpdated {
        /// Access level.
        access_level: u8,
        /// Voting duration.
        voting_duration: u32,
        /// Cooldown before voting starts.
        cooldown_before_voting_start: u64,
        /// Yes threshold.
        yes_threshold: U256,
        /// Yes/no differential.
        yes_no_differential: U256,
        /// Minimum proposition power.
        min_proposition_power: U256,
    },

    /// A voting portal processed (or failed to process) vote results.
    VoteMessageReceived {
        /// Sender on the voting chain.
        origin_sender: Address,
        /// Voting chain.
        origin_chain_id: ChainId,
        /// Whether the results reached governance.
        delivered: bool,
        /// Raw result message.
        message: Vec<u8>,
        /// Failure reason, empty on success.
        reason: String,
    },

    /// A payloads controller received an execution instruction.
    PayloadExecutionMessageReceived {
        /// Sender on the origin chain.
        origin_sender: Address,
        /// Origin chain.
        origin_chain_id: ChainId,
        /// Payload id.
        payload_id: u64,
    },
}

impl ProtocolEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        use ProtocolEvent::*;
        match self {
            SenderUpdated { .. }
            | BridgeAdapterUpdated { .. }
            | ReceiverBridgeAdaptersUpdated { .. }
            | ConfirmationsUpdated { .. }
            | NewInvalidation { .. } => EventTopic::Registry,
            EnvelopeRegistered { .. } | TransactionForwardingAttempted { .. } => {
                EventTopic::Forwarder
            }
            TransactionReceived { .. } | EnvelopeDeliveryAttempted { .. } => EventTopic::Receiver,
            NetworkEmergencyStateUpdated { .. }
            | EmergencySolved { .. }
            | EmergencyOracleUpdated { .. } => EventTopic::Emergency,
            StorageRootProcessed { .. } | StorageSlotProcessed { .. } => EventTopic::ProofVerifier,
            ProposalVoteStarted { .. }
            | ProposalVoteConfigurationBridged { .. }
            | VoteBridged { .. }
            | VoteEmitted { .. }
            | ProposalResultsSent { .. }
            | MessageReceived { .. }
            | IncorrectTypeMessageReceived { .. } => EventTopic::VotingMachine,
            PayloadExecutionMessageReceived { .. } => EventTopic::Payloads,
            _ => EventTopic::Governance,
        }
    }

    /// Variant name, used as the log message.
    #[must_use]
    pub fn name(&self) -> &'static str {
        use ProtocolEvent::*;
        match self {
            SenderUpdated { .. } => "SenderUpdated",
            BridgeAdapterUpdated { .. } => "BridgeAdapterUpdated",
            ReceiverBridgeAdaptersUpdated { .. } => "ReceiverBridgeAdaptersUpdated",
            ConfirmationsUpdated { .. } => "ConfirmationsUpdated",
            NewInvalidation { .. } => "NewInvalidation",
            EnvelopeRegistered { .. } => "EnvelopeRegistered",
            TransactionForwardingAttempted { .. } => "TransactionForwardingAttempted",
            TransactionReceived { .. } => "TransactionReceived",
            EnvelopeDeliveryAttempted { .. } => "EnvelopeDeliveryAttempted",
            NetworkEmergencyStateUpdated { .. } => "NetworkEmergencyStateUpdated",
            EmergencySolved { .. } => "EmergencySolved",
            EmergencyOracleUpdated { .. } => "EmergencyOracleUpdated",
            StorageRootProcessed { .. } => "StorageRootProcessed",
            StorageSlotProcessed { .. } => "StorageSlotProcessed",
            ProposalVoteStarted { .. } => "ProposalVoteStarted",
            ProposalVoteConfigurationBridged { .. } => "ProposalVoteConfigurationBridged",
            VoteBridged { .. } => "VoteBridged",
            VoteEmitted { .. } => "VoteEmitted",
            ProposalResultsSent { .. } => "ProposalResultsSent",
            MessageReceived { .. } => "MessageReceived",
            IncorrectTypeMessageReceived { .. } => "IncorrectTypeMessageReceived",
            ProposalCreated { .. } => "ProposalCreated",
            VotingActivated { .. } => "VotingActivated",
            VoteForwarded { .. } => "VoteForwarded",
            ProposalQueued { .. } => "ProposalQueued",
            ProposalFailed { .. } => "ProposalFailed",
            PayloadSent { .. } => "PayloadSent",
            ProposalExecuted { .. } => "ProposalExecuted",
            ProposalCanceled { .. } => "ProposalCanceled",
            VotingPortalUpdated { .. } => "VotingPortalUpdated",
            PowerStrategyUpdated { .. } => "PowerStrategyUpdated",
            VotingConfigUpdated { .. } => "VotingConfigUpdated",
            VoteMessageReceived { .. } => "VoteMessageReceived",
            PayloadExecutionMessageReceived { .. } => "PayloadExecutionMessageReceived",
        }
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Adapter, sender, confirmation and watermark configuration.
    Registry,
    /// Outbound envelopes and adapter attempts.
    Forwarder,
    /// Confirmations and delivery attempts.
    Receiver,
    /// Emergency registry and emergency mode.
    Emergency,
    /// Storage roots and slots.
    ProofVerifier,
    /// Voting chain events.
    VotingMachine,
    /// Governance chain events.
    Governance,
    /// Payload execution.
    Payloads,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ProtocolEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
