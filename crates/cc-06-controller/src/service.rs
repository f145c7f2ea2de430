//! # Cross-Chain Controller
//!
//! One registry, one forwarder and one receiver per chain, plus the
//! guardian's emergency path.

use std::collections::HashMap;
use std::sync::Arc;

use cc_01_envelope_codec::Envelope;
use cc_03_adapter_registry::{
    AdapterRegistry, BridgeAdapterConfigInput, BridgeAdapterToDisable, ConfirmationInput,
    EmergencyConfigUpdate, ReceiverBridgeAdapterConfigInput, ValidityTimestampInput,
};
use cc_04_forwarder::{AdapterAttempt, BridgeAdapter, ForwardReceipt, Forwarder};
use cc_05_receiver::{DeliveryOutcome, DestinationHandler, ReceiveReport, Receiver};
use cc_telemetry::{log_envelope_event, log_event};
use parking_lot::RwLock;
use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{is_zero_address, to_hex, AccessControl, Address, ChainContext, ChainId};

use crate::adapters::SameChainAdapter;
use crate::config::ControllerConfig;
use crate::domain::ControllerError;
use crate::ports::EmergencyOracle;

const SUBSYSTEM: &str = "cc-06";

#[derive(Debug)]
struct EmergencyState {
    oracle: Address,
    emergency_count: u64,
}

/// Cross-chain controller.
pub struct CrossChainController {
    chain_id: ChainId,
    registry: Arc<RwLock<AdapterRegistry>>,
    forwarder: Forwarder,
    receiver: Receiver,
    events: Arc<dyn EventPublisher>,
    emergency: RwLock<EmergencyState>,
    oracles: RwLock<HashMap<Address, Arc<dyn EmergencyOracle>>>,
}

impl CrossChainController {
    /// Build a controller for the chain described by `ctx`.
    pub fn new(
        config: ControllerConfig,
        ctx: Arc<dyn ChainContext>,
        events: Arc<dyn EventPublisher>,
    ) -> Result<Self, ControllerError> {
        if config.chain_id != ctx.chain_id() {
            return Err(ControllerError::ChainIdMismatch {
                configured: config.chain_id,
                context: ctx.chain_id(),
            });
        }

        let registry = Arc::new(RwLock::new(AdapterRegistry::new(
            AccessControl::new(config.owner, config.guardian),
            Arc::clone(&ctx),
            Arc::clone(&events),
        )));
        let forwarder = Forwarder::new(Arc::clone(&ctx), Arc::clone(&registry), Arc::clone(&events));
        let receiver = Receiver::new(Arc::clone(&ctx), Arc::clone(&registry), Arc::clone(&events));

        log_event!(info, SUBSYSTEM, "[cc-06] Controller initialised", chain_id = config.chain_id);
        Ok(Self {
            chain_id: config.chain_id,
            registry,
            forwarder,
            receiver,
            events,
            emergency: RwLock::new(EmergencyState {
                oracle: config.emergency_oracle,
                emergency_count: 0,
            }),
            oracles: RwLock::new(HashMap::new()),
        })
    }

    /// Chain this controller lives on.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Shared configuration registry.
    pub fn registry(&self) -> &Arc<RwLock<AdapterRegistry>> {
        &self.registry
    }

    /// Outbound half.
    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Inbound half.
    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    // =========================================================================
    // WIRING
    // =========================================================================

    /// Bind a bridge adapter implementation to its configured address.
    pub fn bind_adapter(&self, address: Address, adapter: Arc<dyn BridgeAdapter>) {
        self.forwarder.bind_adapter(address, adapter);
    }

    /// Bind the handler for envelopes addressed to `destination`.
    pub fn bind_handler(&self, destination: Address, handler: Arc<dyn DestinationHandler>) {
        self.receiver.bind_handler(destination, handler);
    }

    /// Adapter delivering to this controller's own handlers.
    pub fn same_chain_adapter(&self) -> Arc<SameChainAdapter> {
        Arc::new(SameChainAdapter::new(self.receiver.handler_book()))
    }

    /// Bind an oracle implementation to its address.
    pub fn bind_emergency_oracle(&self, address: Address, oracle: Arc<dyn EmergencyOracle>) {
        self.oracles.write().insert(address, oracle);
    }

    // =========================================================================
    // FORWARDING AND RECEIVING
    // =========================================================================

    /// See [`Forwarder::forward_message`].
    pub fn forward_message(
        &self,
        caller: &Address,
        destination_chain_id: ChainId,
        destination: Address,
        gas_limit: u64,
        message: Vec<u8>,
    ) -> Result<ForwardReceipt, ControllerError> {
        Ok(self
            .forwarder
            .forward_message(caller, destination_chain_id, destination, gas_limit, message)?)
    }

    /// See [`Forwarder::check_route`].
    pub fn check_route(&self, caller: &Address, destination_chain_id: ChainId) -> Result<(), ControllerError> {
        Ok(self.forwarder.check_route(caller, destination_chain_id)?)
    }

    /// See [`Forwarder::retry_envelope`].
    pub fn retry_envelope(
        &self,
        caller: &Address,
        envelope: &Envelope,
        gas_limit: u64,
    ) -> Result<ForwardReceipt, ControllerError> {
        Ok(self.forwarder.retry_envelope(caller, envelope, gas_limit)?)
    }

    /// See [`Forwarder::retry_transaction`].
    pub fn retry_transaction(
        &self,
        caller: &Address,
        encoded_transaction: &[u8],
        gas_limit: u64,
        bridge_adapters: &[Address],
    ) -> Result<Vec<AdapterAttempt>, ControllerError> {
        Ok(self
            .forwarder
            .retry_transaction(caller, encoded_transaction, gas_limit, bridge_adapters)?)
    }

    /// See [`Receiver::receive_message`].
    pub fn receive_cross_chain_message(
        &self,
        bridge_adapter: &Address,
        encoded_transaction: &[u8],
        origin_chain_id: ChainId,
    ) -> Result<ReceiveReport, ControllerError> {
        Ok(self
            .receiver
            .receive_message(bridge_adapter, encoded_transaction, origin_chain_id)?)
    }

    /// See [`Receiver::deliver_envelope`].
    pub fn deliver_envelope(&self, envelope: &Envelope) -> Result<DeliveryOutcome, ControllerError> {
        let outcome = self.receiver.deliver_envelope(envelope)?;
        log_envelope_event!(
            debug,
            SUBSYSTEM,
            "[cc-06] Delivery retried",
            to_hex(&envelope.id()),
            delivered = outcome.is_delivered()
        );
        Ok(outcome)
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// Approve senders.
    pub fn approve_senders(&self, caller: &Address, senders: &[Address]) -> Result<(), ControllerError> {
        Ok(self.registry.write().approve_senders(caller, senders)?)
    }

    /// Remove senders.
    pub fn remove_senders(&self, caller: &Address, senders: &[Address]) -> Result<(), ControllerError> {
        Ok(self.registry.write().remove_senders(caller, senders)?)
    }

    /// Enable forwarder adapter pairs.
    pub fn enable_bridge_adapters(
        &self,
        caller: &Address,
        adapters: &[BridgeAdapterConfigInput],
    ) -> Result<(), ControllerError> {
        Ok(self.registry.write().enable_bridge_adapters(caller, adapters)?)
    }

    /// Disable forwarder adapters.
    pub fn disable_bridge_adapters(
        &self,
        caller: &Address,
        adapters: &[BridgeAdapterToDisable],
    ) -> Result<(), ControllerError> {
        Ok(self.registry.write().disable_bridge_adapters(caller, adapters)?)
    }

    /// Allow receiver adapters.
    pub fn allow_receiver_bridge_adapters(
        &self,
        caller: &Address,
        adapters: &[ReceiverBridgeAdapterConfigInput],
    ) -> Result<(), ControllerError> {
        Ok(self.registry.write().allow_receiver_bridge_adapters(caller, adapters)?)
    }

    /// Disallow receiver adapters.
    pub fn disallow_receiver_bridge_adapters(
        &self,
        caller: &Address,
        adapters: &[ReceiverBridgeAdapterConfigInput],
    ) -> Result<(), ControllerError> {
        Ok(self
            .registry
            .write()
            .disallow_receiver_bridge_adapters(caller, adapters)?)
    }

    /// Set required confirmations.
    pub fn update_confirmations(
        &self,
        caller: &Address,
        confirmations: &[ConfirmationInput],
    ) -> Result<(), ControllerError> {
        Ok(self.registry.write().update_confirmations(caller, confirmations)?)
    }

    /// Set invalidation watermarks.
    pub fn update_messages_validity_timestamp(
        &self,
        caller: &Address,
        timestamps: &[ValidityTimestampInput],
    ) -> Result<(), ControllerError> {
        Ok(self.receiver.update_invalidation_watermark(caller, timestamps)?)
    }

    // =========================================================================
    // EMERGENCY MODE
    // =========================================================================

    /// Replace the emergency oracle (owner only).
    pub fn update_emergency_oracle(&self, caller: &Address, oracle: Address) -> Result<(), ControllerError> {
        self.registry.read().access().only_owner(caller)?;
        if is_zero_address(&oracle) {
            return Err(ControllerError::InvalidEmergencyOracle);
        }
        self.emergency.write().oracle = oracle;

        log_event!(info, SUBSYSTEM, "[cc-06] Emergency oracle updated", oracle = %to_hex(&oracle));
        self.events.publish(ProtocolEvent::EmergencyOracleUpdated {
            emergency_oracle: oracle,
        });
        Ok(())
    }

    /// Address of the current emergency oracle.
    pub fn get_emergency_oracle(&self) -> Address {
        self.emergency.read().oracle
    }

    /// Last emergency count solved.
    pub fn get_emergency_count(&self) -> u64 {
        self.emergency.read().emergency_count
    }

    /// Reconfigure the controller during an emergency (guardian only).
    ///
    /// Requires the oracle to report more emergencies than have been solved.
    /// The update is applied atomically; on success the local count catches
    /// up with the oracle.
    pub fn solve_emergency(&self, caller: &Address, update: &EmergencyConfigUpdate) -> Result<(), ControllerError> {
        self.registry.read().access().only_guardian(caller)?;

        let oracle_count = self.latest_oracle_count();
        let local_count = self.get_emergency_count();
        if oracle_count <= local_count {
            return Err(ControllerError::NotInEmergency {
                oracle_count,
                local_count,
            });
        }

        self.registry.write().apply_emergency_update(caller, update)?;
        self.emergency.write().emergency_count = oracle_count;

        log_event!(warn, SUBSYSTEM, "[cc-06] Emergency solved", emergency_count = oracle_count);
        self.events.publish(ProtocolEvent::EmergencySolved {
            emergency_count: oracle_count,
        });
        Ok(())
    }

    fn latest_oracle_count(&self) -> u64 {
        let address = self.emergency.read().oracle;
        self.oracles
            .read()
            .get(&address)
            .map_or(0, |oracle| oracle.latest_emergency_count())
    }
}
