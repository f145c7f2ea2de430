//! # Domain Entities
//!
//! Configuration inputs and stored adapter configuration.

use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId, Timestamp};

/// Forwarding pair stored per destination chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIdBridgeConfig {
    /// Adapter on the destination chain that will call the receiver.
    pub destination_bridge_adapter: Address,
    /// Adapter on this chain that sends.
    pub current_chain_bridge_adapter: Address,
}

/// Input for enabling a forwarder adapter pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeAdapterConfigInput {
    /// Adapter on this chain.
    pub current_chain_bridge_adapter: Address,
    /// Adapter on the destination chain.
    pub destination_bridge_adapter: Address,
    /// Destination chain.
    pub destination_chain_id: ChainId,
}

/// Input for disabling a forwarder adapter on several chains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeAdapterToDisable {
    /// Adapter on this chain.
    pub bridge_adapter: Address,
    /// Destination chains to remove it from.
    pub chain_ids: Vec<ChainId>,
}

/// Input for allowing or disallowing a receiver adapter on several chains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverBridgeAdapterConfigInput {
    /// Adapter calling the receiver.
    pub bridge_adapter: Address,
    /// Origin chains.
    pub chain_ids: Vec<ChainId>,
}

/// Input for a confirmation threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationInput {
    /// Origin chain.
    pub chain_id: ChainId,
    /// Distinct adapters required.
    pub required_confirmations: u8,
}

/// Input for an invalidation watermark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityTimestampInput {
    /// Origin chain.
    pub chain_id: ChainId,
    /// Transactions first bridged at or before this are void.
    pub valid_timestamp: Timestamp,
}

/// Receiver configuration of one origin chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverConfiguration {
    /// Distinct adapters required to confirm.
    pub required_confirmation: u8,
    /// Invalidation watermark.
    pub valid_timestamp: Timestamp,
}

/// Configuration changes applied by the guardian while solving an emergency.
///
/// Applied in field order: disallow, allow, confirmations, validity
/// timestamps, sender removal, sender approval, forwarder disable, enable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyConfigUpdate {
    /// Receiver adapters to remove.
    pub receiver_adapters_to_disallow: Vec<ReceiverBridgeAdapterConfigInput>,
    /// Receiver adapters to add.
    pub receiver_adapters_to_allow: Vec<ReceiverBridgeAdapterConfigInput>,
    /// New thresholds.
    pub new_confirmations: Vec<ConfirmationInput>,
    /// New watermarks.
    pub new_validity_timestamps: Vec<ValidityTimestampInput>,
    /// Senders to remove.
    pub senders_to_remove: Vec<Address>,
    /// Senders to approve.
    pub senders_to_approve: Vec<Address>,
    /// Forwarder adapters to disable.
    pub forwarder_adapters_to_disable: Vec<BridgeAdapterToDisable>,
    /// Forwarder adapters to enable.
    pub forwarder_adapters_to_enable: Vec<BridgeAdapterConfigInput>,
}
