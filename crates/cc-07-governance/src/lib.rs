//! # CC-07 Governance
//!
//! Proposal lifecycle on the governance chain, vote counting on voting
//! chains and payload execution on execution chains, all talking through
//! cross-chain controllers (cc-06).
//!
//! **Subsystem ID:** 07
//!
//! ## Message flow
//!
//! ```text
//! Governance --activate--> VotingPortal ==Proposal==> VotingMachine
//! Governance --vote------> VotingPortal ==Vote======> VotingMachine
//! VotingMachine ==Result==> VotingPortal --queue--> Governance
//! Governance ==PayloadExecution==> PayloadsController
//! ```
//!
//! `==>` hops travel as envelopes. Voting power is proven with storage
//! proofs against the proposal's snapshot block, read through the data
//! warehouse (cc-02).
//!
//! ## Locking
//!
//! Services keep their state behind their own locks and release them
//! before calling a forwarder, portal or governance, so a delivery may
//! reply through the same controller in the same call.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{ForwardedMessage, MockPowerStrategy, RecordingForwarder};
pub use config::{
    GovernanceConfig, PayloadsControllerConfig, VotingAssetsConfig, VotingConfig,
    VotingMachineConfig, VotingPortalConfig,
};
pub use domain::{
    AccessLevel, BridgedVote, GovernanceError, Payload, Proposal, ProposalState, ProposalVote,
    ProposalVoteConfiguration, ProposalVoteState, Vote, VotingBalanceProof,
};
pub use ports::{MessageForwarder, PropositionPowerStrategy, VotingPortalPort};
pub use service::{
    Governance, PayloadsController, VotingMachine, VotingPortal, VotingStrategy,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
