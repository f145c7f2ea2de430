//! # Adapter Registry
//!
//! Owner-controlled configuration shared by the forwarder and the receiver.
//!
//! Every batch entry point is all-or-nothing: changes are applied to a draft
//! of the state and committed, with their events, only if the whole batch
//! validates.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{
    is_zero_address, to_hex, AccessControl, Address, ChainContext, ChainId, Timestamp,
};
use tracing::info;

use crate::domain::{
    BridgeAdapterConfigInput, BridgeAdapterToDisable, ChainIdBridgeConfig, ConfirmationInput,
    EmergencyConfigUpdate, ReceiverBridgeAdapterConfigInput, ReceiverConfiguration,
    RegistryError, ValidityTimestampInput,
};

#[derive(Clone, Debug, Default)]
struct RegistryState {
    approved_senders: BTreeSet<Address>,
    forwarder_adapters: BTreeMap<ChainId, Vec<ChainIdBridgeConfig>>,
    receiver_adapters: BTreeMap<ChainId, Vec<Address>>,
    receiver_configs: BTreeMap<ChainId, ReceiverConfiguration>,
}

/// Bridge adapter registry.
pub struct AdapterRegistry {
    access: AccessControl,
    ctx: Arc<dyn ChainContext>,
    events: Arc<dyn EventPublisher>,
    state: RegistryState,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new(
        access: AccessControl,
        ctx: Arc<dyn ChainContext>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            access,
            ctx,
            events,
            state: RegistryState::default(),
        }
    }

    /// Owner and guardian.
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Apply `f` to a draft; commit state and publish events only on success.
    fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut RegistryState, &mut Vec<ProtocolEvent>, Timestamp) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut draft = self.state.clone();
        let mut emitted = Vec::new();
        let out = f(&mut draft, &mut emitted, self.ctx.now())?;
        self.state = draft;
        for event in emitted {
            self.events.publish(event);
        }
        Ok(out)
    }

    // =========================================================================
    // SENDERS
    // =========================================================================

    /// Approve senders allowed to call `forward`.
    pub fn approve_senders(&mut self, caller: &Address, senders: &[Address]) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;
        self.transact(|state, events, _| {
            set_senders(state, events, senders, true);
            Ok(())
        })
    }

    /// Remove approved senders.
    pub fn remove_senders(&mut self, caller: &Address, senders: &[Address]) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;
        self.transact(|state, events, _| {
            set_senders(state, events, senders, false);
            Ok(())
        })
    }

    /// True when `sender` may forward messages.
    pub fn is_sender_approved(&self, sender: &Address) -> bool {
        self.state.approved_senders.contains(sender)
    }

    // =========================================================================
    // FORWARDER ADAPTERS
    // =========================================================================

    /// Enable forwarding pairs.
    pub fn enable_bridge_adapters(
        &mut self,
        caller: &Address,
        adapters: &[BridgeAdapterConfigInput],
    ) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;
        self.transact(|state, events, _| enable_forwarders(state, events, adapters))
    }

    /// Disable forwarding adapters on the listed chains.
    pub fn disable_bridge_adapters(
        &mut self,
        caller: &Address,
        adapters: &[BridgeAdapterToDisable],
    ) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;
        self.transact(|state, events, _| {
            disable_forwarders(state, events, adapters);
            Ok(())
        })
    }

    /// Forwarding pairs for a destination chain, in enable order.
    pub fn get_forwarder_bridge_adapters_by_chain(&self, chain_id: ChainId) -> Vec<ChainIdBridgeConfig> {
        self.state
            .forwarder_adapters
            .get(&chain_id)
            .cloned()
            .unwrap_or_default()
    }

    // =========================================================================
    // RECEIVER ADAPTERS
    // =========================================================================

    /// Allow receiver adapters. Already-allowed pairs are silent no-ops.
    pub fn allow_receiver_bridge_adapters(
        &mut self,
        caller: &Address,
        adapters: &[ReceiverBridgeAdapterConfigInput],
    ) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;
        self.transact(|state, events, _| set_receivers(state, events, adapters, true))
    }

    /// Disallow receiver adapters. Absent pairs are silent no-ops.
    pub fn disallow_receiver_bridge_adapters(
        &mut self,
        caller: &Address,
        adapters: &[ReceiverBridgeAdapterConfigInput],
    ) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;
        self.transact(|state, events, _| set_receivers(state, events, adapters, false))
    }

    /// True when `adapter` may confirm transactions from `chain_id`.
    pub fn is_receiver_bridge_adapter_allowed(&self, adapter: &Address, chain_id: ChainId) -> bool {
        self.state
            .receiver_adapters
            .get(&chain_id)
            .is_some_and(|list| list.contains(adapter))
    }

    /// Receiver adapters allowed for an origin chain.
    pub fn get_receiver_bridge_adapters_by_chain(&self, chain_id: ChainId) -> Vec<Address> {
        self.state
            .receiver_adapters
            .get(&chain_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Origin chains with at least one allowed receiver adapter.
    pub fn get_supported_chains(&self) -> Vec<ChainId> {
        self.state.receiver_adapters.keys().copied().collect()
    }

    // =========================================================================
    // CONFIRMATIONS AND INVALIDATION
    // =========================================================================

    /// Set required confirmations per origin chain.
    pub fn update_confirmations(
        &mut self,
        caller: &Address,
        confirmations: &[ConfirmationInput],
    ) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;
        self.transact(|state, events, _| set_confirmations(state, events, confirmations))
    }

    /// Set invalidation watermarks. Not required to be monotonic.
    pub fn update_messages_validity_timestamp(
        &mut self,
        caller: &Address,
        timestamps: &[ValidityTimestampInput],
    ) -> Result<(), RegistryError> {
        self.access.only_owner(caller)?;
        self.transact(|state, events, now| set_validity(state, events, timestamps, now))
    }

    /// Required confirmations and watermark of an origin chain.
    pub fn get_configuration_by_chain(&self, chain_id: ChainId) -> ReceiverConfiguration {
        self.state
            .receiver_configs
            .get(&chain_id)
            .copied()
            .unwrap_or_default()
    }

    // =========================================================================
    // EMERGENCY
    // =========================================================================

    /// Guardian-only reconfiguration applied while solving an emergency.
    ///
    /// The caller is responsible for checking that an emergency is active.
    pub fn apply_emergency_update(
        &mut self,
        caller: &Address,
        update: &EmergencyConfigUpdate,
    ) -> Result<(), RegistryError> {
        self.access.only_guardian(caller)?;
        self.transact(|state, events, now| {
            set_receivers(state, events, &update.receiver_adapters_to_disallow, false)?;
            set_receivers(state, events, &update.receiver_adapters_to_allow, true)?;
            set_confirmations(state, events, &update.new_confirmations)?;
            set_validity(state, events, &update.new_validity_timestamps, now)?;
            set_senders(state, events, &update.senders_to_remove, false);
            set_senders(state, events, &update.senders_to_approve, true);
            disable_forwarders(state, events, &update.forwarder_adapters_to_disable);
            enable_forwarders(state, events, &update.forwarder_adapters_to_enable)
        })
    }
}

fn set_senders(
    state: &mut RegistryState,
    events: &mut Vec<ProtocolEvent>,
    senders: &[Address],
    is_approved: bool,
) {
    for sender in senders {
        if is_approved {
            state.approved_senders.insert(*sender);
        } else {
            state.approved_senders.remove(sender);
        }
        info!(sender = %to_hex(sender), is_approved, "[cc-03] Sender updated");
        events.push(ProtocolEvent::SenderUpdated {
            sender: *sender,
            is_approved,
        });
    }
}

fn enable_forwarders(
    state: &mut RegistryState,
    events: &mut Vec<ProtocolEvent>,
    adapters: &[BridgeAdapterConfigInput],
) -> Result<(), RegistryError> {
    for input in adapters {
        if is_zero_address(&input.current_chain_bridge_adapter)
            || is_zero_address(&input.destination_bridge_adapter)
        {
            return Err(RegistryError::InvalidAdapter);
        }
        let list = state
            .forwarder_adapters
            .entry(input.destination_chain_id)
            .or_default();
        match list
            .iter_mut()
            .find(|c| c.current_chain_bridge_adapter == input.current_chain_bridge_adapter)
        {
            Some(existing) => existing.destination_bridge_adapter = input.destination_bridge_adapter,
            None => list.push(ChainIdBridgeConfig {
                destination_bridge_adapter: input.destination_bridge_adapter,
                current_chain_bridge_adapter: input.current_chain_bridge_adapter,
            }),
        }
        info!(
            chain_id = input.destination_chain_id,
            adapter = %to_hex(&input.current_chain_bridge_adapter),
            "[cc-03] Forwarder adapter enabled"
        );
        events.push(ProtocolEvent::BridgeAdapterUpdated {
            destination_chain_id: input.destination_chain_id,
            bridge_adapter: input.current_chain_bridge_adapter,
            destination_bridge_adapter: input.destination_bridge_adapter,
            allowed: true,
        });
    }
    Ok(())
}

fn disable_forwarders(
    state: &mut RegistryState,
    events: &mut Vec<ProtocolEvent>,
    adapters: &[BridgeAdapterToDisable],
) {
    for input in adapters {
        for chain_id in &input.chain_ids {
            let Some(list) = state.forwarder_adapters.get_mut(chain_id) else {
                continue;
            };
            let Some(position) = list
                .iter()
                .position(|c| c.current_chain_bridge_adapter == input.bridge_adapter)
            else {
                continue;
            };
            let removed = list.remove(position);
            if list.is_empty() {
                state.forwarder_adapters.remove(chain_id);
            }
            info!(
                chain_id,
                adapter = %to_hex(&input.bridge_adapter),
                "[cc-03] Forwarder adapter disabled"
            );
            events.push(ProtocolEvent::BridgeAdapterUpdated {
                destination_chain_id: *chain_id,
                bridge_adapter: input.bridge_adapter,
                destination_bridge_adapter: removed.destination_bridge_adapter,
                allowed: false,
            });
        }
    }
}

fn set_receivers(
    state: &mut RegistryState,
    events: &mut Vec<ProtocolEvent>,
    adapters: &[ReceiverBridgeAdapterConfigInput],
    allowed: bool,
) -> Result<(), RegistryError> {
    for input in adapters {
        if is_zero_address(&input.bridge_adapter) {
            return Err(RegistryError::InvalidAdapter);
        }
        for chain_id in &input.chain_ids {
            let list = state.receiver_adapters.entry(*chain_id).or_default();
            let present = list.contains(&input.bridge_adapter);
            let changed = match (allowed, present) {
                (true, false) => {
                    list.push(input.bridge_adapter);
                    true
                }
                (false, true) => {
                    list.retain(|a| *a != input.bridge_adapter);
                    true
                }
                _ => false,
            };
            if list.is_empty() {
                state.receiver_adapters.remove(chain_id);
            }
            if changed {
                info!(
                    chain_id,
                    adapter = %to_hex(&input.bridge_adapter),
                    allowed,
                    "[cc-03] Receiver adapter updated"
                );
                events.push(ProtocolEvent::ReceiverBridgeAdaptersUpdated {
                    bridge_adapter: input.bridge_adapter,
                    allowed,
                    chain_id: *chain_id,
                });
            }
        }
    }
    Ok(())
}

fn set_confirmations(
    state: &mut RegistryState,
    events: &mut Vec<ProtocolEvent>,
    confirmations: &[ConfirmationInput],
) -> Result<(), RegistryError> {
    for input in confirmations {
        let allowed = state
            .receiver_adapters
            .get(&input.chain_id)
            .map_or(0, Vec::len);
        if input.required_confirmations == 0 || usize::from(input.required_confirmations) > allowed {
            return Err(RegistryError::InvalidConfirmationCount {
                chain_id: input.chain_id,
                requested: input.required_confirmations,
                allowed,
            });
        }
        state
            .receiver_configs
            .entry(input.chain_id)
            .or_default()
            .required_confirmation = input.required_confirmations;
        info!(
            chain_id = input.chain_id,
            required = input.required_confirmations,
            "[cc-03] Confirmations updated"
        );
        events.push(ProtocolEvent::ConfirmationsUpdated {
            new_confirmations: input.required_confirmations,
            chain_id: input.chain_id,
        });
    }
    Ok(())
}

fn set_validity(
    state: &mut RegistryState,
    events: &mut Vec<ProtocolEvent>,
    timestamps: &[ValidityTimestampInput],
    now: Timestamp,
) -> Result<(), RegistryError> {
    for input in timestamps {
        if input.valid_timestamp > now {
            return Err(RegistryError::FutureTimestamp {
                chain_id: input.chain_id,
                timestamp: input.valid_timestamp,
                now,
            });
        }
        state
            .receiver_configs
            .entry(input.chain_id)
            .or_default()
            .valid_timestamp = input.valid_timestamp;
        info!(
            chain_id = input.chain_id,
            valid_timestamp = input.valid_timestamp,
            "[cc-03] Invalidation watermark updated"
        );
        events.push(ProtocolEvent::NewInvalidation {
            invalid_timestamp: input.valid_timestamp,
            chain_id: input.chain_id,
        });
    }
    Ok(())
}
