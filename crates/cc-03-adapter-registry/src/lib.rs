//! # CC-03 Adapter Registry
//!
//! Configuration shared by the forwarder and the receiver:
//!
//! - approved senders
//! - forwarder adapter pairs per destination chain
//! - receiver adapter allow-lists per origin chain
//! - required confirmations and invalidation watermark per origin chain
//! - per-chain emergency counters
//!
//! **Subsystem ID:** 03
//!
//! All mutating entry points take the caller explicitly and check it against
//! [`shared_types::AccessControl`]. Batches are all-or-nothing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod emergency;
pub mod registry;

pub use domain::{
    BridgeAdapterConfigInput, BridgeAdapterToDisable, ChainIdBridgeConfig, ConfirmationInput,
    EmergencyConfigUpdate, ReceiverBridgeAdapterConfigInput, ReceiverConfiguration,
    RegistryError, ValidityTimestampInput,
};
pub use emergency::EmergencyRegistry;
pub use registry::AdapterRegistry;
