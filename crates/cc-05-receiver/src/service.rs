//! # Receiver Service
//!
//! Counts confirmations from distinct allowed adapters and promotes an
//! envelope to `Confirmed` once its origin chain's threshold is met, unless
//! the transaction was first bridged at or before the chain's invalidation
//! watermark.
//!
//! Promotion and delivery happen in the same call. A failed delivery keeps
//! the confirmation bookkeeping and leaves the envelope `Confirmed` for a
//! later `deliver_envelope`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cc_01_envelope_codec::{Envelope, Transaction};
use cc_03_adapter_registry::{AdapterRegistry, ValidityTimestampInput};
use parking_lot::{Mutex, RwLock};
use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{to_hex, Address, ChainContext, ChainId, Hash};
use tracing::{debug, info, warn};

use crate::domain::{
    DeliveryOutcome, EnvelopeState, ReceiveReport, ReceiveStatus, ReceiverError, TransactionState,
};
use crate::ports::{DestinationHandler, HandlerBook};

#[derive(Debug, Default)]
struct TransactionRecord {
    state: TransactionState,
    received_by: HashSet<Address>,
}

#[derive(Debug, Default)]
struct ReceiverState {
    transactions: HashMap<Hash, TransactionRecord>,
    envelopes: HashMap<Hash, EnvelopeState>,
}

/// Cross-chain receiver.
pub struct Receiver {
    ctx: Arc<dyn ChainContext>,
    registry: Arc<RwLock<AdapterRegistry>>,
    handlers: Arc<HandlerBook>,
    events: Arc<dyn EventPublisher>,
    state: Mutex<ReceiverState>,
}

impl Receiver {
    /// Create a receiver over a shared registry.
    pub fn new(
        ctx: Arc<dyn ChainContext>,
        registry: Arc<RwLock<AdapterRegistry>>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            ctx,
            registry,
            handlers: Arc::new(HandlerBook::new()),
            events,
            state: Mutex::new(ReceiverState::default()),
        }
    }

    /// Bind the handler that consumes envelopes addressed to `destination`.
    pub fn bind_handler(&self, destination: Address, handler: Arc<dyn DestinationHandler>) {
        self.handlers.bind(destination, handler);
    }

    /// Destination handlers known to this receiver, shared with same-chain
    /// delivery paths.
    pub fn handler_book(&self) -> Arc<HandlerBook> {
        Arc::clone(&self.handlers)
    }

    /// Accept one adapter's confirmation of `encoded_transaction`.
    pub fn receive_message(
        &self,
        bridge_adapter: &Address,
        encoded_transaction: &[u8],
        origin_chain_id: ChainId,
    ) -> Result<ReceiveReport, ReceiverError> {
        let configuration = {
            let registry = self.registry.read();
            if !registry.is_receiver_bridge_adapter_allowed(bridge_adapter, origin_chain_id) {
                return Err(ReceiverError::AdapterNotAllowed {
                    adapter: *bridge_adapter,
                    chain_id: origin_chain_id,
                });
            }
            registry.get_configuration_by_chain(origin_chain_id)
        };

        let transaction = Transaction::decode(encoded_transaction)?;
        let envelope = transaction.envelope()?;
        let local_chain_id = self.ctx.chain_id();
        if envelope.origin_chain_id != origin_chain_id
            || envelope.destination_chain_id != local_chain_id
        {
            return Err(ReceiverError::ChainIdMismatch {
                envelope_origin: envelope.origin_chain_id,
                envelope_destination: envelope.destination_chain_id,
                origin_chain_id,
                local_chain_id,
            });
        }
        let transaction_id = transaction.id();
        let envelope_id = transaction.envelope_id();
        let now = self.ctx.now();

        let (confirmations, promote) = {
            let mut state = self.state.lock();
            let record = state.transactions.entry(transaction_id).or_default();

            if record.received_by.contains(bridge_adapter) {
                debug!(
                    transaction_id = %to_hex(&transaction_id),
                    adapter = %to_hex(bridge_adapter),
                    "[cc-05] Duplicate confirmation ignored"
                );
                return Ok(ReceiveReport {
                    transaction_id,
                    envelope_id,
                    confirmations: record.state.confirmations,
                    status: ReceiveStatus::AlreadyReceived,
                });
            }
            if record.state.confirmations > 0
                && record.state.first_bridged_at <= configuration.valid_timestamp
            {
                debug!(
                    transaction_id = %to_hex(&transaction_id),
                    first_bridged_at = record.state.first_bridged_at,
                    watermark = configuration.valid_timestamp,
                    "[cc-05] Confirmation for invalidated transaction ignored"
                );
                return Ok(ReceiveReport {
                    transaction_id,
                    envelope_id,
                    confirmations: record.state.confirmations,
                    status: ReceiveStatus::Invalidated,
                });
            }

            record.received_by.insert(*bridge_adapter);
            if record.state.confirmations == 0 {
                record.state.first_bridged_at = now;
            }
            record.state.confirmations = record.state.confirmations.saturating_add(1);
            let confirmations = record.state.confirmations;
            let first_bridged_at = record.state.first_bridged_at;

            let threshold_met = configuration.required_confirmation > 0
                && confirmations >= configuration.required_confirmation;
            let envelope_state = state.envelopes.entry(envelope_id).or_default();
            let promote = threshold_met
                && first_bridged_at > configuration.valid_timestamp
                && *envelope_state == EnvelopeState::None;
            if promote {
                *envelope_state = EnvelopeState::Confirmed;
            }
            (confirmations, promote)
        };

        info!(
            transaction_id = %to_hex(&transaction_id),
            envelope_id = %to_hex(&envelope_id),
            adapter = %to_hex(bridge_adapter),
            origin_chain_id,
            confirmations,
            "[cc-05] Transaction received"
        );
        self.events.publish(ProtocolEvent::TransactionReceived {
            transaction_id,
            envelope_id,
            origin_chain_id,
            transaction: encoded_transaction.to_vec(),
            bridge_adapter: *bridge_adapter,
            confirmations,
        });

        let status = if promote {
            info!(envelope_id = %to_hex(&envelope_id), "[cc-05] Envelope confirmed");
            ReceiveStatus::DeliveryAttempted(self.attempt_delivery(envelope_id, envelope))
        } else {
            ReceiveStatus::Recorded
        };

        Ok(ReceiveReport {
            transaction_id,
            envelope_id,
            confirmations,
            status,
        })
    }

    /// Retry delivery of a confirmed envelope. Callable by anyone.
    pub fn deliver_envelope(&self, envelope: &Envelope) -> Result<DeliveryOutcome, ReceiverError> {
        let envelope_id = envelope.id();
        match self.get_envelope_state(&envelope_id) {
            EnvelopeState::None => Err(ReceiverError::EnvelopeNotConfirmed(envelope_id)),
            EnvelopeState::Delivered => Ok(DeliveryOutcome::AlreadyDelivered),
            EnvelopeState::Confirmed => Ok(self.attempt_delivery(envelope_id, envelope.clone())),
        }
    }

    /// Move the invalidation watermark of origin chains (owner only).
    pub fn update_invalidation_watermark(
        &self,
        caller: &Address,
        timestamps: &[ValidityTimestampInput],
    ) -> Result<(), ReceiverError> {
        self.registry
            .write()
            .update_messages_validity_timestamp(caller, timestamps)?;
        Ok(())
    }

    /// Confirmation state of a transaction.
    pub fn get_transaction_state(&self, transaction_id: &Hash) -> TransactionState {
        self.state
            .lock()
            .transactions
            .get(transaction_id)
            .map(|record| record.state)
            .unwrap_or_default()
    }

    /// Delivery state of an envelope.
    pub fn get_envelope_state(&self, envelope_id: &Hash) -> EnvelopeState {
        self.state
            .lock()
            .envelopes
            .get(envelope_id)
            .copied()
            .unwrap_or_default()
    }

    /// True when `adapter` has confirmed `transaction_id`.
    pub fn is_transaction_received_by_adapter(&self, transaction_id: &Hash, adapter: &Address) -> bool {
        self.state
            .lock()
            .transactions
            .get(transaction_id)
            .is_some_and(|record| record.received_by.contains(adapter))
    }

    /// Marks the envelope `Delivered` before calling the handler and puts it
    /// back to `Confirmed` if the handler fails, so a reentrant or concurrent
    /// delivery of the same envelope sees it as already delivered.
    fn attempt_delivery(&self, envelope_id: Hash, envelope: Envelope) -> DeliveryOutcome {
        {
            let mut state = self.state.lock();
            match state.envelopes.get_mut(&envelope_id) {
                Some(slot) if *slot == EnvelopeState::Confirmed => *slot = EnvelopeState::Delivered,
                _ => return DeliveryOutcome::AlreadyDelivered,
            }
        }

        let result = self.handlers.deliver(
            &envelope.destination,
            &envelope.origin,
            envelope.origin_chain_id,
            &envelope.message,
        );

        let outcome = match result {
            Ok(()) => {
                info!(envelope_id = %to_hex(&envelope_id), "[cc-05] Envelope delivered");
                DeliveryOutcome::Delivered
            }
            Err(error) => {
                self.state
                    .lock()
                    .envelopes
                    .insert(envelope_id, EnvelopeState::Confirmed);
                warn!(
                    envelope_id = %to_hex(&envelope_id),
                    destination = %to_hex(&envelope.destination),
                    %error,
                    "[cc-05] Envelope delivery failed"
                );
                DeliveryOutcome::Failed(error.0)
            }
        };

        self.events.publish(ProtocolEvent::EnvelopeDeliveryAttempted {
            envelope_id,
            envelope,
            is_delivered: outcome.is_delivered(),
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingHandler;
    use cc_03_adapter_registry::{ConfirmationInput, ReceiverBridgeAdapterConfigInput};
    use proptest::prelude::*;
    use shared_bus::InMemoryEventBus;
    use shared_types::{address_from_u64, chains, AccessControl, ManualChainContext};

    const OWNER: Address = [0x01; 20];
    const GUARDIAN: Address = [0x02; 20];
    const CAROL: Address = [0xC0; 20];
    const DESTINATION: Address = [0xDE; 20];
    const START: u64 = 1_700_000_000;

    struct Harness {
        receiver: Receiver,
        registry: Arc<RwLock<AdapterRegistry>>,
        ctx: Arc<ManualChainContext>,
        bus: Arc<InMemoryEventBus>,
        handler: Arc<RecordingHandler>,
    }

    fn adapter(n: u64) -> Address {
        address_from_u64(0xAD00 + n)
    }

    /// Receiver on Polygon accepting `adapters` from Ethereum.
    fn setup(adapters: u64, required: u8) -> Harness {
        let bus = Arc::new(InMemoryEventBus::new());
        let ctx = Arc::new(ManualChainContext::new(chains::POLYGON, START));
        let registry = Arc::new(RwLock::new(AdapterRegistry::new(
            AccessControl::new(OWNER, GUARDIAN),
            ctx.clone(),
            bus.clone(),
        )));
        {
            let mut registry = registry.write();
            let allowed: Vec<_> = (0..adapters)
                .map(|n| ReceiverBridgeAdapterConfigInput {
                    bridge_adapter: adapter(n),
                    chain_ids: vec![chains::ETHEREUM],
                })
                .collect();
            registry
                .allow_receiver_bridge_adapters(&OWNER, &allowed)
                .unwrap();
            registry
                .update_confirmations(
                    &OWNER,
                    &[ConfirmationInput {
                        chain_id: chains::ETHEREUM,
                        required_confirmations: required,
                    }],
                )
                .unwrap();
        }
        bus.drain();

        let receiver = Receiver::new(ctx.clone(), registry.clone(), bus.clone());
        let handler = Arc::new(RecordingHandler::new());
        receiver.bind_handler(DESTINATION, handler.clone());
        Harness {
            receiver,
            registry,
            ctx,
            bus,
            handler,
        }
    }

    fn envelope() -> Envelope {
        Envelope {
            nonce: 0,
            origin: CAROL,
            destination: DESTINATION,
            origin_chain_id: chains::ETHEREUM,
            destination_chain_id: chains::POLYGON,
            message: b"test message".to_vec(),
        }
    }

    fn transaction() -> Transaction {
        Transaction::new(0, envelope().encode())
    }

    #[test]
    fn test_single_confirmation_delivers() {
        let h = setup(1, 1);
        let encoded = transaction().encode();
        let report = h
            .receiver
            .receive_message(&adapter(0), &encoded, chains::ETHEREUM)
            .unwrap();

        assert_eq!(report.transaction_id, transaction().id());
        assert_eq!(report.envelope_id, envelope().id());
        assert_eq!(report.status, ReceiveStatus::DeliveryAttempted(DeliveryOutcome::Delivered));
        assert_eq!(
            h.receiver.get_transaction_state(&report.transaction_id),
            TransactionState {
                confirmations: 1,
                first_bridged_at: START,
            }
        );
        assert_eq!(h.receiver.get_envelope_state(&report.envelope_id), EnvelopeState::Delivered);
        assert!(h
            .receiver
            .is_transaction_received_by_adapter(&report.transaction_id, &adapter(0)));

        let received = h.handler.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].origin_sender, CAROL);
        assert_eq!(received[0].origin_chain_id, chains::ETHEREUM);
        assert_eq!(received[0].message, b"test message".to_vec());

        let names: Vec<_> = h.bus.history().iter().map(ProtocolEvent::name).collect();
        assert_eq!(names, vec!["TransactionReceived", "EnvelopeDeliveryAttempted"]);
    }

    #[test]
    fn test_two_confirmation_threshold() {
        let h = setup(2, 2);
        let encoded = transaction().encode();

        let first = h
            .receiver
            .receive_message(&adapter(0), &encoded, chains::ETHEREUM)
            .unwrap();
        assert_eq!(first.status, ReceiveStatus::Recorded);
        assert_eq!(h.receiver.get_envelope_state(&first.envelope_id), EnvelopeState::None);

        // Same adapter again: idempotent, silent.
        h.bus.drain();
        h.ctx.advance(12);
        let again = h
            .receiver
            .receive_message(&adapter(0), &encoded, chains::ETHEREUM)
            .unwrap();
        assert_eq!(again.status, ReceiveStatus::AlreadyReceived);
        assert_eq!(again.confirmations, 1);
        assert!(h.bus.history().is_empty());

        let second = h
            .receiver
            .receive_message(&adapter(1), &encoded, chains::ETHEREUM)
            .unwrap();
        assert_eq!(second.confirmations, 2);
        assert_eq!(second.status, ReceiveStatus::DeliveryAttempted(DeliveryOutcome::Delivered));
        assert_eq!(
            h.receiver.get_transaction_state(&second.transaction_id).first_bridged_at,
            START
        );
        assert_eq!(h.receiver.get_envelope_state(&second.envelope_id), EnvelopeState::Delivered);
    }

    #[test]
    fn test_late_confirmation_does_not_redeliver() {
        let h = setup(3, 2);
        let encoded = transaction().encode();
        for n in 0..3 {
            h.receiver
                .receive_message(&adapter(n), &encoded, chains::ETHEREUM)
                .unwrap();
        }
        assert_eq!(h.handler.received().len(), 1);
        assert_eq!(h.receiver.get_transaction_state(&transaction().id()).confirmations, 3);
    }

    #[test]
    fn test_watermark_blocks_in_flight_transaction() {
        let h = setup(2, 2);
        let encoded = transaction().encode();
        h.receiver
            .receive_message(&adapter(0), &encoded, chains::ETHEREUM)
            .unwrap();

        h.ctx.advance(86_400);
        h.receiver
            .update_invalidation_watermark(
                &OWNER,
                &[ValidityTimestampInput {
                    chain_id: chains::ETHEREUM,
                    valid_timestamp: h.ctx.now(),
                }],
            )
            .unwrap();
        h.bus.drain();

        let report = h
            .receiver
            .receive_message(&adapter(1), &encoded, chains::ETHEREUM)
            .unwrap();
        assert_eq!(report.status, ReceiveStatus::Invalidated);
        assert_eq!(h.receiver.get_transaction_state(&report.transaction_id).confirmations, 1);
        assert_eq!(h.receiver.get_envelope_state(&report.envelope_id), EnvelopeState::None);
        assert!(h.bus.history().is_empty());
    }

    #[test]
    fn test_watermark_exact_boundary() {
        // Bridged at the watermark: never promotable.
        let h = setup(1, 1);
        h.receiver
            .update_invalidation_watermark(
                &OWNER,
                &[ValidityTimestampInput {
                    chain_id: chains::ETHEREUM,
                    valid_timestamp: START,
                }],
            )
            .unwrap();
        let report = h
            .receiver
            .receive_message(&adapter(0), &transaction().encode(), chains::ETHEREUM)
            .unwrap();
        assert_eq!(report.status, ReceiveStatus::Recorded);
        assert_eq!(h.receiver.get_envelope_state(&report.envelope_id), EnvelopeState::None);

        // Bridged one second after the watermark: promotable.
        let h = setup(1, 1);
        h.receiver
            .update_invalidation_watermark(
                &OWNER,
                &[ValidityTimestampInput {
                    chain_id: chains::ETHEREUM,
                    valid_timestamp: START,
                }],
            )
            .unwrap();
        h.ctx.advance(1);
        let report = h
            .receiver
            .receive_message(&adapter(0), &transaction().encode(), chains::ETHEREUM)
            .unwrap();
        assert_eq!(report.status, ReceiveStatus::DeliveryAttempted(DeliveryOutcome::Delivered));
    }

    #[test]
    fn test_failed_delivery_keeps_confirmation() {
        let h = setup(1, 1);
        h.handler.set_to_revert(true);
        let report = h
            .receiver
            .receive_message(&adapter(0), &transaction().encode(), chains::ETHEREUM)
            .unwrap();
        assert!(matches!(
            report.status,
            ReceiveStatus::DeliveryAttempted(DeliveryOutcome::Failed(_))
        ));
        assert_eq!(h.receiver.get_envelope_state(&report.envelope_id), EnvelopeState::Confirmed);
        assert_eq!(
            h.bus.history().last(),
            Some(&ProtocolEvent::EnvelopeDeliveryAttempted {
                envelope_id: report.envelope_id,
                envelope: envelope(),
                is_delivered: false,
            })
        );

        h.handler.set_to_revert(false);
        assert_eq!(
            h.receiver.deliver_envelope(&envelope()),
            Ok(DeliveryOutcome::Delivered)
        );
        assert_eq!(h.receiver.get_envelope_state(&report.envelope_id), EnvelopeState::Delivered);

        // Delivered stays delivered; no handler call, no event.
        h.bus.drain();
        assert_eq!(
            h.receiver.deliver_envelope(&envelope()),
            Ok(DeliveryOutcome::AlreadyDelivered)
        );
        assert_eq!(h.handler.received().len(), 1);
        assert!(h.bus.history().is_empty());
    }

    #[test]
    fn test_deliver_unconfirmed_envelope() {
        let h = setup(1, 1);
        assert_eq!(
            h.receiver.deliver_envelope(&envelope()),
            Err(ReceiverError::EnvelopeNotConfirmed(envelope().id()))
        );
    }

    #[test]
    fn test_unbound_destination_is_failed_delivery() {
        let h = setup(1, 1);
        let stray = Envelope {
            destination: [0x77; 20],
            ..envelope()
        };
        let report = h
            .receiver
            .receive_message(
                &adapter(0),
                &Transaction::new(0, stray.encode()).encode(),
                chains::ETHEREUM,
            )
            .unwrap();
        assert!(matches!(
            report.status,
            ReceiveStatus::DeliveryAttempted(DeliveryOutcome::Failed(_))
        ));
    }

    /// Calls back into the receiver from inside its own delivery.
    #[derive(Default)]
    struct ReentrantHandler {
        receiver: Mutex<std::sync::Weak<Receiver>>,
        calls: Mutex<usize>,
        nested: Mutex<Option<Result<DeliveryOutcome, ReceiverError>>>,
        fail: Mutex<bool>,
    }

    impl DestinationHandler for ReentrantHandler {
        fn receive_cross_chain_message(
            &self,
            _origin_sender: &Address,
            _origin_chain_id: ChainId,
            _message: &[u8],
        ) -> Result<(), crate::domain::HandlerError> {
            *self.calls.lock() += 1;
            let receiver = self.receiver.lock().upgrade();
            if let Some(receiver) = receiver {
                *self.nested.lock() = Some(receiver.deliver_envelope(&envelope()));
            }
            if *self.fail.lock() {
                return Err(crate::domain::HandlerError::new("reverted"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_reentrant_delivery_calls_handler_once() {
        let h = setup(1, 1);
        let receiver = Arc::new(Receiver::new(h.ctx.clone(), h.registry.clone(), h.bus.clone()));
        let handler = Arc::new(ReentrantHandler::default());
        *handler.receiver.lock() = Arc::downgrade(&receiver);
        *handler.fail.lock() = true;
        receiver.bind_handler(DESTINATION, handler.clone());

        // Failing handler: the nested call sees the claim, the state is restored.
        let report = receiver
            .receive_message(&adapter(0), &transaction().encode(), chains::ETHEREUM)
            .unwrap();
        assert!(matches!(
            report.status,
            ReceiveStatus::DeliveryAttempted(DeliveryOutcome::Failed(_))
        ));
        assert_eq!(*handler.calls.lock(), 1);
        assert_eq!(
            handler.nested.lock().take(),
            Some(Ok(DeliveryOutcome::AlreadyDelivered))
        );
        assert_eq!(receiver.get_envelope_state(&envelope().id()), EnvelopeState::Confirmed);

        // Retry succeeds with a single handler call.
        *handler.fail.lock() = false;
        assert_eq!(receiver.deliver_envelope(&envelope()), Ok(DeliveryOutcome::Delivered));
        assert_eq!(*handler.calls.lock(), 2);
        assert_eq!(
            handler.nested.lock().take(),
            Some(Ok(DeliveryOutcome::AlreadyDelivered))
        );
        assert_eq!(receiver.get_envelope_state(&envelope().id()), EnvelopeState::Delivered);
    }

    #[test]
    fn test_rejections() {
        let h = setup(1, 1);
        let encoded = transaction().encode();
        assert_eq!(
            h.receiver
                .receive_message(&adapter(9), &encoded, chains::ETHEREUM),
            Err(ReceiverError::AdapterNotAllowed {
                adapter: adapter(9),
                chain_id: chains::ETHEREUM,
            })
        );

        let wrong_route = Envelope {
            destination_chain_id: chains::AVALANCHE,
            ..envelope()
        };
        assert!(matches!(
            h.receiver.receive_message(
                &adapter(0),
                &Transaction::new(0, wrong_route.encode()).encode(),
                chains::ETHEREUM
            ),
            Err(ReceiverError::ChainIdMismatch { .. })
        ));

        assert!(matches!(
            h.receiver
                .receive_message(&adapter(0), b"garbage", chains::ETHEREUM),
            Err(ReceiverError::Codec(_))
        ));
        assert!(h.bus.history().is_empty());
    }

    #[test]
    fn test_removed_adapter_cannot_confirm() {
        let h = setup(2, 1);
        h.registry
            .write()
            .disallow_receiver_bridge_adapters(
                &OWNER,
                &[ReceiverBridgeAdapterConfigInput {
                    bridge_adapter: adapter(1),
                    chain_ids: vec![chains::ETHEREUM],
                }],
            )
            .unwrap();
        assert!(matches!(
            h.receiver
                .receive_message(&adapter(1), &transaction().encode(), chains::ETHEREUM),
            Err(ReceiverError::AdapterNotAllowed { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_confirmation_order_independent(order in Just((0..4u64).collect::<Vec<_>>()).prop_shuffle()) {
            let h = setup(4, 3);
            let encoded = transaction().encode();
            for n in &order {
                h.ctx.advance(1);
                h.receiver.receive_message(&adapter(*n), &encoded, chains::ETHEREUM).unwrap();
            }
            let state = h.receiver.get_transaction_state(&transaction().id());
            prop_assert_eq!(state.confirmations, 4);
            prop_assert_eq!(state.first_bridged_at, START + 1);
            prop_assert_eq!(h.receiver.get_envelope_state(&envelope().id()), EnvelopeState::Delivered);
            prop_assert_eq!(h.handler.received().len(), 1);
        }
    }
}
