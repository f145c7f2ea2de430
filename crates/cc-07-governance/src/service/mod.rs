//! # Service Layer
//!
//! Governance chain: [`Governance`] and its [`VotingPortal`]s.
//! Voting chains: [`VotingMachine`] over a [`VotingStrategy`].
//! Execution chains: [`PayloadsController`].

pub mod governance;
pub mod payloads_controller;
pub mod voting_machine;
pub mod voting_portal;
pub mod voting_strategy;

pub use governance::Governance;
pub use payloads_controller::PayloadsController;
pub use voting_machine::VotingMachine;
pub use voting_portal::VotingPortal;
pub use voting_strategy::VotingStrategy;
