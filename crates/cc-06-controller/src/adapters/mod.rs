//! # Adapters Layer
//!
//! Bridge adapters and oracles used by the controller.

mod emergency_oracle;
mod in_memory_bridge;
mod same_chain;

pub use emergency_oracle::RegistryEmergencyOracle;
pub use in_memory_bridge::InMemoryBridge;
pub use same_chain::SameChainAdapter;
