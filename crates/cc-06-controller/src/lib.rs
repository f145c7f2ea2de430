//! # CC-06 Cross-Chain Controller
//!
//! Composes the forwarder (cc-04) and receiver (cc-05) over one adapter
//! registry (cc-03), and adds emergency mode: when the emergency oracle
//! reports a new network emergency the guardian may reconfigure adapters,
//! confirmations, watermarks and senders in one atomic step.
//!
//! **Subsystem ID:** 06
//!
//! ## Adapters
//!
//! | Adapter | Use |
//! |---------|-----|
//! | [`SameChainAdapter`] | destination on the sending chain |
//! | [`InMemoryBridge`] | two controllers in one process |
//! | [`RegistryEmergencyOracle`] | emergency count from an `EmergencyRegistry` |
//!
//! ## Locking
//!
//! Registry, forwarder and receiver each guard their own state and never
//! hold a lock across an adapter or handler call, so a delivery may
//! forward a reply through the same controller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryBridge, RegistryEmergencyOracle, SameChainAdapter};
pub use config::ControllerConfig;
pub use domain::ControllerError;
pub use ports::EmergencyOracle;
pub use service::CrossChainController;
