//! # Domain Errors
//!
//! One error type for governance, the voting portal, the voting machine and
//! the voting strategy. Errors from the controller, the proof verifier and
//! the codec are carried unchanged.

use cc_01_envelope_codec::CodecError;
use cc_02_proof_verifier::ProofError;
use cc_06_controller::ControllerError;
use shared_types::{to_hex, AccessError, Address, ChainId, U256};
use thiserror::Error;

/// Governance errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    /// Caller lacks the required role.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The cross-chain controller refused to forward.
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// A storage proof could not be checked.
    #[error(transparent)]
    Proof(#[from] ProofError),

    /// A message could not be decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    // =========================================================================
    // GOVERNANCE
    // =========================================================================
    /// Access level byte out of range.
    #[error("Invalid access level {0}")]
    InvalidAccessLevel(u8),

    /// A proposal needs at least one payload.
    #[error("A proposal needs at least one payload")]
    AtLeastOnePayload,

    /// Payload with the null access level.
    #[error("Payload {0} has no access level")]
    InvalidPayloadAccessLevel(u64),

    /// No voting configuration for the proposal's level.
    #[error("No voting configuration for access level {0}")]
    VotingConfigNotSet(u8),

    /// Voting configuration with the null level or an unusable duration.
    #[error("Invalid voting configuration for access level {0}")]
    InvalidVotingConfig(u8),

    /// The voting portal is not approved.
    #[error("Voting portal {} is not approved", to_hex(.0))]
    VotingPortalNotApproved(Address),

    /// No implementation bound to an approved portal address.
    #[error("No voting portal bound at {}", to_hex(.0))]
    VotingPortalNotBound(Address),

    /// The zero address cannot be a voting portal.
    #[error("Invalid voting portal address")]
    InvalidVotingPortalAddress,

    /// `rescue_voting_portal` while portals remain.
    #[error("Voting portals count is not zero")]
    VotingPortalsCountNotZero,

    /// The creator's proposition power is below the level minimum.
    #[error("Proposition power too low: {actual} < {required}")]
    PropositionPowerTooLow {
        /// Level minimum
        required: U256,
        /// Creator's current power
        actual: U256,
    },

    /// Operation needs a proposal in `Created`.
    #[error("Proposal {0} is not in created state")]
    ProposalNotInCreatedState(u64),

    /// Operation needs a proposal in `Active`.
    #[error("Proposal {0} is not in active state")]
    ProposalNotInActiveState(u64),

    /// Operation needs a proposal in `Queued`.
    #[error("Proposal {0} is not in queued state")]
    ProposalNotInQueuedState(u64),

    /// Cancellation of a proposal that is missing or already settled.
    #[error("Proposal {0} is not in a cancellable state")]
    ProposalNotInCorrectState(u64),

    /// Caller may not cancel while the creator keeps enough power.
    #[error("Caller {} cannot cancel proposal {proposal_id}", to_hex(.caller))]
    CallerCannotCancel {
        /// Proposal
        proposal_id: u64,
        /// Caller
        caller: Address,
    },

    /// Activation before the level cooldown passed.
    #[error("Voting start cooldown for proposal {0} has not passed")]
    VotingStartCooldownNotPassed(u64),

    /// Queueing before the voting duration elapsed.
    #[error("Voting duration for proposal {0} has not passed")]
    VotingDurationNotPassed(u64),

    /// Execution before the queue cooldown passed.
    #[error("Queue cooldown for proposal {0} has not passed")]
    QueueCooldownNotPassed(u64),

    /// Vote via portal with no assets or more than the cap.
    #[error("Invalid voting tokens: {count} (allowed 1..={cap})")]
    InvalidVotingTokens {
        /// Assets supplied
        count: usize,
        /// Cap
        cap: usize,
    },

    /// `queue_proposal` from something other than the proposal's portal.
    #[error("Caller {} is not a valid voting portal", to_hex(.0))]
    CallerNotValidVotingPortal(Address),

    // =========================================================================
    // VOTING PORTAL
    // =========================================================================
    /// Portal entry point called by someone other than governance.
    #[error("Caller {} is not governance", to_hex(.0))]
    CallerNotGovernance(Address),

    /// A voter already voted through this portal.
    #[error("Voter {} already voted on proposal {proposal_id}", to_hex(.voter))]
    VoterAlreadyVotedOnProposal {
        /// Proposal
        proposal_id: u64,
        /// Voter
        voter: Address,
    },

    /// Message from an unexpected sender or chain.
    #[error("Wrong message origin {} on chain {chain_id}", to_hex(.sender))]
    WrongMessageOrigin {
        /// Origin sender
        sender: Address,
        /// Origin chain
        chain_id: ChainId,
    },

    // =========================================================================
    // VOTING MACHINE
    // =========================================================================
    /// Message tag with no handler.
    #[error("unsupported message type")]
    UnsupportedMessageType,

    /// A vote configuration for this proposal already arrived.
    #[error("Vote configuration for proposal {0} already bridged")]
    AlreadyBridged(u64),

    /// `start_proposal_vote` with no bridged configuration.
    #[error("Missing vote configuration for proposal {0}")]
    MissingProposalConfiguration(u64),

    /// `start_proposal_vote` on a started vote.
    #[error("Vote for proposal {0} already created")]
    ProposalVoteAlreadyCreated(u64),

    /// Voting outside the active window.
    #[error("Vote for proposal {0} is not active")]
    VoteNotActive(u64),

    /// The same asset/slot twice in one vote.
    #[error("Asset {} slot {slot} submitted twice", to_hex(.asset))]
    VoteOncePerAsset {
        /// Asset
        asset: Address,
        /// Slot
        slot: u128,
    },

    /// A voter already has a vote on this proposal.
    #[error("Voter {} already voted on proposal {proposal_id}", to_hex(.voter))]
    AlreadyVoted {
        /// Proposal
        proposal_id: u64,
        /// Voter
        voter: Address,
    },

    /// The storage proof shows no balance slot for the voter.
    #[error("No balance of {} slot {slot} at the snapshot block", to_hex(.asset))]
    UserBalanceDoesNotExist {
        /// Asset
        asset: Address,
        /// Slot
        slot: u128,
    },

    /// The proven balances carry no voting power.
    #[error("User voting balance is zero")]
    UserVotingBalanceIsZero,

    /// Asset/slot not accepted by the voting strategy.
    #[error("Invalid voting asset {} slot {slot}", to_hex(.asset))]
    InvalidVotingAsset {
        /// Asset
        asset: Address,
        /// Slot
        slot: u128,
    },

    /// A vote for this voter was already bridged.
    #[error("Vote of {} on proposal {proposal_id} already bridged", to_hex(.voter))]
    VoteAlreadyBridged {
        /// Proposal
        proposal_id: u64,
        /// Voter
        voter: Address,
    },

    /// Settlement with no bridged assets or a different proof count.
    #[error("Portal vote has no voting tokens to settle")]
    NoVotingTokens,

    /// Settlement proofs do not match the bridged assets.
    #[error("Proofs are not for the bridged voting tokens")]
    ProofSetMismatch,

    /// Closing before the vote ended.
    #[error("Vote for proposal {0} is not finished")]
    VoteNotFinished(u64),

    /// Results already sent.
    #[error("Results for proposal {0} already sent")]
    ResultsAlreadySent(u64),

    // =========================================================================
    // VOTING STRATEGY
    // =========================================================================
    /// No AAVE storage root for the snapshot block.
    #[error("Missing AAVE storage roots")]
    MissingAaveRoots,

    /// No stkAAVE storage root for the snapshot block.
    #[error("Missing stkAAVE storage roots")]
    MissingStkAaveRoots,

    /// No aAAVE storage root for the snapshot block.
    #[error("Missing aAAVE storage roots")]
    MissingAAaveRoots,

    /// The stkAAVE exchange rate slot was not proven for the snapshot block.
    #[error("Missing stkAAVE exchange rate")]
    MissingStkAaveExchangeRate,
}
