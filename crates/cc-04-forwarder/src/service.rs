//! # Forwarder Service
//!
//! Packages outbound envelopes into transactions and fans them out across
//! every forwarder adapter enabled for the destination chain.
//!
//! Bookkeeping happens under the state lock; adapter calls happen after it
//! is released, so an adapter may call back into this chain.

use std::collections::HashSet;
use std::sync::Arc;

use cc_01_envelope_codec::{Envelope, Transaction};
use cc_03_adapter_registry::{AdapterRegistry, ChainIdBridgeConfig};
use parking_lot::{Mutex, RwLock};
use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{to_hex, Address, ChainContext, ChainId, Hash};
use tracing::{info, warn};

use crate::domain::{AdapterAttempt, AdapterResult, ForwardReceipt, ForwarderError};
use crate::ports::{AdapterBook, BridgeAdapter};

#[derive(Debug, Default)]
struct ForwarderState {
    envelope_nonce: u64,
    transaction_nonce: u64,
    registered_envelopes: HashSet<Hash>,
    forwarded_transactions: HashSet<Hash>,
}

/// Cross-chain forwarder.
pub struct Forwarder {
    ctx: Arc<dyn ChainContext>,
    registry: Arc<RwLock<AdapterRegistry>>,
    adapters: AdapterBook,
    events: Arc<dyn EventPublisher>,
    state: Mutex<ForwarderState>,
}

impl Forwarder {
    /// Create a forwarder over a shared registry.
    pub fn new(
        ctx: Arc<dyn ChainContext>,
        registry: Arc<RwLock<AdapterRegistry>>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            ctx,
            registry,
            adapters: AdapterBook::new(),
            events,
            state: Mutex::new(ForwarderState::default()),
        }
    }

    /// Bind an adapter implementation to its configured address.
    pub fn bind_adapter(&self, address: Address, adapter: Arc<dyn BridgeAdapter>) {
        self.adapters.bind(address, adapter);
    }

    /// Adapter implementations known to this forwarder.
    pub fn adapter_book(&self) -> &AdapterBook {
        &self.adapters
    }

    /// Forward `message` to `destination` on `destination_chain_id`.
    ///
    /// Fails only on authorization or when the chain has no adapters.
    /// Individual adapter failures are reported in the receipt and as
    /// `TransactionForwardingAttempted` events.
    pub fn forward_message(
        &self,
        caller: &Address,
        destination_chain_id: ChainId,
        destination: Address,
        gas_limit: u64,
        message: Vec<u8>,
    ) -> Result<ForwardReceipt, ForwarderError> {
        let adapters = self.route(caller, destination_chain_id)?;

        let (envelope, transaction) = {
            let mut state = self.state.lock();
            let envelope = Envelope {
                nonce: state.envelope_nonce,
                origin: *caller,
                destination,
                origin_chain_id: self.ctx.chain_id(),
                destination_chain_id,
                message,
            };
            state.envelope_nonce += 1;
            let encoded_envelope = envelope.encoded();
            state.registered_envelopes.insert(encoded_envelope.id);

            let transaction = Transaction::new(state.transaction_nonce, encoded_envelope.data);
            state.transaction_nonce += 1;
            (envelope, transaction)
        };
        let envelope_id = envelope.id();

        info!(
            envelope_id = %to_hex(&envelope_id),
            nonce = envelope.nonce,
            destination_chain_id,
            "[cc-04] Envelope registered"
        );
        self.events.publish(ProtocolEvent::EnvelopeRegistered {
            envelope_id,
            envelope,
        });

        Ok(self.send_transaction(&transaction, envelope_id, destination_chain_id, gas_limit, &adapters))
    }

    /// Check that `caller` could forward to `destination_chain_id` now,
    /// without registering or sending anything.
    pub fn check_route(&self, caller: &Address, destination_chain_id: ChainId) -> Result<(), ForwarderError> {
        self.route(caller, destination_chain_id).map(|_| ())
    }

    fn route(
        &self,
        caller: &Address,
        destination_chain_id: ChainId,
    ) -> Result<Vec<ChainIdBridgeConfig>, ForwarderError> {
        let registry = self.registry.read();
        if !registry.is_sender_approved(caller) {
            return Err(ForwarderError::SenderNotApproved(*caller));
        }
        let adapters = registry.get_forwarder_bridge_adapters_by_chain(destination_chain_id);
        if adapters.is_empty() {
            return Err(ForwarderError::NoBridgeAdaptersForChain(destination_chain_id));
        }
        Ok(adapters)
    }

    /// Send a registered envelope again under a new transaction.
    ///
    /// Returns the same envelope id with a fresh transaction id.
    pub fn retry_envelope(
        &self,
        caller: &Address,
        envelope: &Envelope,
        gas_limit: u64,
    ) -> Result<ForwardReceipt, ForwarderError> {
        let adapters = {
            let registry = self.registry.read();
            registry.access().only_owner_or_guardian(caller)?;
            registry.get_forwarder_bridge_adapters_by_chain(envelope.destination_chain_id)
        };

        let encoded_envelope = envelope.encoded();
        if !self.is_envelope_registered(&encoded_envelope.id) {
            return Err(ForwarderError::EnvelopeNotRegistered(encoded_envelope.id));
        }
        if adapters.is_empty() {
            return Err(ForwarderError::NoBridgeAdaptersForChain(envelope.destination_chain_id));
        }

        let transaction = {
            let mut state = self.state.lock();
            let transaction = Transaction::new(state.transaction_nonce, encoded_envelope.data);
            state.transaction_nonce += 1;
            transaction
        };

        info!(
            envelope_id = %to_hex(&encoded_envelope.id),
            transaction_nonce = transaction.nonce,
            "[cc-04] Retrying envelope"
        );
        Ok(self.send_transaction(
            &transaction,
            encoded_envelope.id,
            envelope.destination_chain_id,
            gas_limit,
            &adapters,
        ))
    }

    /// Re-send an already forwarded transaction through `bridge_adapters`.
    ///
    /// Only listed adapters that are still enabled for the destination chain
    /// are used. The transaction id does not change.
    pub fn retry_transaction(
        &self,
        caller: &Address,
        encoded_transaction: &[u8],
        gas_limit: u64,
        bridge_adapters: &[Address],
    ) -> Result<Vec<AdapterAttempt>, ForwarderError> {
        self.registry.read().access().only_owner_or_guardian(caller)?;

        let transaction = Transaction::decode(encoded_transaction)?;
        let transaction_id = transaction.id();
        if !self.is_transaction_forwarded(&transaction_id) {
            return Err(ForwarderError::TransactionNotForwarded(transaction_id));
        }

        let mut seen = HashSet::with_capacity(bridge_adapters.len());
        if let Some(duplicate) = bridge_adapters.iter().find(|a| !seen.insert(**a)) {
            return Err(ForwarderError::DuplicateAdapterInList(*duplicate));
        }

        let envelope = transaction.envelope()?;
        let selected: Vec<ChainIdBridgeConfig> = self
            .registry
            .read()
            .get_forwarder_bridge_adapters_by_chain(envelope.destination_chain_id)
            .into_iter()
            .filter(|config| bridge_adapters.contains(&config.current_chain_bridge_adapter))
            .collect();
        if selected.is_empty() {
            return Err(ForwarderError::NoBridgeAdaptersForChain(envelope.destination_chain_id));
        }

        info!(
            transaction_id = %to_hex(&transaction_id),
            adapters = selected.len(),
            "[cc-04] Retrying transaction"
        );
        let receipt = self.send_transaction(
            &transaction,
            transaction.envelope_id(),
            envelope.destination_chain_id,
            gas_limit,
            &selected,
        );
        Ok(receipt.attempts)
    }

    /// Next envelope nonce.
    pub fn get_current_envelope_nonce(&self) -> u64 {
        self.state.lock().envelope_nonce
    }

    /// Next transaction nonce.
    pub fn get_current_transaction_nonce(&self) -> u64 {
        self.state.lock().transaction_nonce
    }

    /// True when this forwarder registered `envelope_id`.
    pub fn is_envelope_registered(&self, envelope_id: &Hash) -> bool {
        self.state.lock().registered_envelopes.contains(envelope_id)
    }

    /// True when this forwarder sent `transaction_id`.
    pub fn is_transaction_forwarded(&self, transaction_id: &Hash) -> bool {
        self.state.lock().forwarded_transactions.contains(transaction_id)
    }

    fn send_transaction(
        &self,
        transaction: &Transaction,
        envelope_id: Hash,
        destination_chain_id: ChainId,
        gas_limit: u64,
        adapters: &[ChainIdBridgeConfig],
    ) -> ForwardReceipt {
        let encoded = transaction.encoded();
        self.state.lock().forwarded_transactions.insert(encoded.id);

        let attempts = adapters
            .iter()
            .map(|config| {
                let result = match self.adapters.get(&config.current_chain_bridge_adapter) {
                    Some(adapter) => adapter.forward_message(
                        &config.destination_bridge_adapter,
                        gas_limit,
                        destination_chain_id,
                        &encoded.data,
                    ),
                    None => AdapterResult::failed("adapter not bound"),
                };

                if result.success {
                    info!(
                        transaction_id = %to_hex(&encoded.id),
                        adapter = %to_hex(&config.current_chain_bridge_adapter),
                        destination_chain_id,
                        "[cc-04] Transaction forwarded"
                    );
                } else {
                    warn!(
                        transaction_id = %to_hex(&encoded.id),
                        adapter = %to_hex(&config.current_chain_bridge_adapter),
                        reason = %String::from_utf8_lossy(&result.return_data),
                        "[cc-04] Adapter failed to forward transaction"
                    );
                }
                self.events.publish(ProtocolEvent::TransactionForwardingAttempted {
                    transaction_id: encoded.id,
                    envelope_id,
                    encoded_transaction: encoded.data.clone(),
                    destination_chain_id,
                    bridge_adapter: config.current_chain_bridge_adapter,
                    destination_bridge_adapter: config.destination_bridge_adapter,
                    adapter_successful: result.success,
                    return_data: result.return_data.clone(),
                });

                AdapterAttempt {
                    bridge_adapter: config.current_chain_bridge_adapter,
                    destination_bridge_adapter: config.destination_bridge_adapter,
                    result,
                }
            })
            .collect();

        ForwardReceipt {
            envelope_id,
            transaction_id: encoded.id,
            attempts,
        }
    }
}
