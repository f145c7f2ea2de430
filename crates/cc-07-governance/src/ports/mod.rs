//! # Ports Layer

pub mod outbound;

pub use outbound::{MessageForwarder, PropositionPowerStrategy, VotingPortalPort};
