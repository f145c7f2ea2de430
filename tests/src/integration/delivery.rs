//! # Cross-Chain Delivery
//!
//! Envelopes forwarded on Ethereum and delivered on Polygon through one or
//! more in-memory bridges.
//!
//! ## Flow Tested:
//!
//! 1. **Forwarder (Ethereum)**: register the envelope, wrap it in a
//!    transaction, hand it to every enabled bridge
//! 2. **Receiver (Polygon)**: count confirmations per transaction, promote
//!    the envelope once the threshold is met and the watermark passed
//! 3. **Destination**: the handler bound to the envelope's destination

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use cc_01_envelope_codec::Envelope;
    use cc_03_adapter_registry::{ReceiverBridgeAdapterConfigInput, ValidityTimestampInput};
    use cc_04_forwarder::MockBridgeAdapter;
    use cc_05_receiver::{DeliveryOutcome, EnvelopeState, RecordingHandler};
    use shared_bus::{EventFilter, EventTopic, ProtocolEvent};
    use shared_types::{chains, Address, ChainContext, Hash};
    use tokio::time::timeout;

    use crate::harness::{connect, local_adapter, remote_adapter, Chain, Network};

    const SENDER: Address = [0xC0; 20];
    const DESTINATION: Address = [0xDE; 20];

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn network(bridges: u64, required: u8) -> (Network, Arc<RecordingHandler>) {
        let network = Network::new(bridges, required).unwrap();
        network.ethereum.approve_senders(&[SENDER]).unwrap();
        let handler = Arc::new(RecordingHandler::new());
        network.polygon.controller.bind_handler(DESTINATION, handler.clone());
        network.ethereum.bus.drain();
        (network, handler)
    }

    fn registered_envelope(chain: &Chain, envelope_id: &Hash) -> Envelope {
        chain
            .bus
            .history()
            .into_iter()
            .find_map(|event| match event {
                ProtocolEvent::EnvelopeRegistered {
                    envelope_id: id,
                    envelope,
                } if id == *envelope_id => Some(envelope),
                _ => None,
            })
            .unwrap()
    }

    fn forwarded_transaction(chain: &Chain, transaction_id: &Hash) -> Vec<u8> {
        chain
            .bus
            .history()
            .into_iter()
            .find_map(|event| match event {
                ProtocolEvent::TransactionForwardingAttempted {
                    transaction_id: id,
                    encoded_transaction,
                    ..
                } if id == *transaction_id => Some(encoded_transaction),
                _ => None,
            })
            .unwrap()
    }

    // =============================================================================
    // SINGLE BRIDGE
    // =============================================================================

    #[test]
    fn test_message_crosses_chains() {
        let (network, handler) = network(1, 1);

        let receipt = network
            .ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 2000, b"test message".to_vec())
            .unwrap();

        assert_eq!(receipt.successful_attempts(), 1);
        let received = handler.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].origin_sender, SENDER);
        assert_eq!(received[0].origin_chain_id, chains::ETHEREUM);
        assert_eq!(received[0].message, b"test message".to_vec());

        let envelope = registered_envelope(&network.ethereum, &receipt.envelope_id);
        assert_eq!(envelope.nonce, 0);
        assert_eq!(envelope.destination_chain_id, chains::POLYGON);
        assert_eq!(
            network.polygon.controller.receiver().get_envelope_state(&receipt.envelope_id),
            EnvelopeState::Delivered
        );
        assert_eq!(
            network.ethereum.event_names(),
            vec!["EnvelopeRegistered", "TransactionForwardingAttempted"]
        );
        assert_eq!(
            network.polygon.event_names(),
            vec!["TransactionReceived", "EnvelopeDeliveryAttempted"]
        );
    }

    #[test]
    fn test_envelope_nonces_increase_per_message() {
        let (network, handler) = network(1, 1);
        let forwarder = network.ethereum.controller.forwarder();

        for n in 0..3u8 {
            network
                .ethereum
                .controller
                .forward_message(&SENDER, chains::POLYGON, DESTINATION, 0, vec![n])
                .unwrap();
        }

        assert_eq!(forwarder.get_current_envelope_nonce(), 3);
        let messages: Vec<_> = handler.received().into_iter().map(|m| m.message).collect();
        assert_eq!(messages, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_unapproved_sender_cannot_forward() {
        let (network, handler) = network(1, 1);
        let result = network.ethereum.controller.forward_message(
            &[0x66; 20],
            chains::POLYGON,
            DESTINATION,
            0,
            b"nope".to_vec(),
        );
        assert!(result.is_err());
        assert!(handler.received().is_empty());
        assert!(network.polygon.bus.history().is_empty());
    }

    #[test]
    fn test_disallowed_bridge_fails_attempt() {
        let (network, handler) = network(1, 1);
        network
            .polygon
            .controller
            .disallow_receiver_bridge_adapters(
                &network.polygon.owner(),
                &[ReceiverBridgeAdapterConfigInput {
                    bridge_adapter: remote_adapter(chains::ETHEREUM, 0),
                    chain_ids: vec![chains::ETHEREUM],
                }],
            )
            .unwrap();

        let receipt = network
            .ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 0, b"blocked".to_vec())
            .unwrap();

        assert_eq!(receipt.successful_attempts(), 0);
        assert!(handler.received().is_empty());
        assert_eq!(network.polygon.count_events("TransactionReceived"), 0);
    }

    // =============================================================================
    // CONFIRMATIONS
    // =============================================================================

    #[test]
    fn test_two_confirmations_deliver_once() {
        let (network, handler) = network(2, 2);

        let receipt = network
            .ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 2000, b"test message".to_vec())
            .unwrap();

        assert_eq!(receipt.successful_attempts(), 2);
        assert_eq!(handler.received().len(), 1);
        let receiver = network.polygon.controller.receiver();
        assert_eq!(receiver.get_transaction_state(&receipt.transaction_id).confirmations, 2);
        for n in 0..2 {
            assert!(receiver.is_transaction_received_by_adapter(
                &receipt.transaction_id,
                &remote_adapter(chains::ETHEREUM, n)
            ));
        }
        assert_eq!(network.polygon.count_events("TransactionReceived"), 2);
        assert_eq!(network.polygon.count_events("EnvelopeDeliveryAttempted"), 1);
    }

    #[test]
    fn test_second_bridge_completes_quorum_on_retry() {
        let (network, handler) = network(2, 2);
        let stalled = local_adapter(chains::ETHEREUM, 1);
        network
            .ethereum
            .controller
            .bind_adapter(stalled, Arc::new(MockBridgeAdapter::new()));

        let receipt = network
            .ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 0, b"slow".to_vec())
            .unwrap();
        let receiver = network.polygon.controller.receiver();
        assert_eq!(receiver.get_transaction_state(&receipt.transaction_id).confirmations, 1);
        assert_eq!(receiver.get_envelope_state(&receipt.envelope_id), EnvelopeState::None);
        assert!(handler.received().is_empty());

        // Bridge recovers; the same transaction goes through it again.
        network.ethereum.controller.bind_adapter(
            stalled,
            Arc::new(cc_06_controller::InMemoryBridge::new(
                chains::ETHEREUM,
                &network.polygon.controller,
            )),
        );
        let encoded = forwarded_transaction(&network.ethereum, &receipt.transaction_id);
        let attempts = network
            .ethereum
            .controller
            .retry_transaction(&network.ethereum.owner(), &encoded, 0, &[stalled])
            .unwrap();

        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].result.success);
        assert_eq!(receiver.get_transaction_state(&receipt.transaction_id).confirmations, 2);
        assert_eq!(receiver.get_envelope_state(&receipt.envelope_id), EnvelopeState::Delivered);
        assert_eq!(handler.received().len(), 1);
    }

    // =============================================================================
    // WATERMARK AND RETRIES
    // =============================================================================

    #[test]
    fn test_watermark_boundary_across_chains() {
        let (network, handler) = network(1, 1);
        let watermark = network.polygon.ctx.now();
        network
            .polygon
            .controller
            .update_messages_validity_timestamp(
                &network.polygon.owner(),
                &[ValidityTimestampInput {
                    chain_id: chains::ETHEREUM,
                    valid_timestamp: watermark,
                }],
            )
            .unwrap();

        // Bridged exactly at the watermark: recorded, never delivered.
        let blocked = network
            .ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 0, b"at".to_vec())
            .unwrap();
        let receiver = network.polygon.controller.receiver();
        assert_eq!(receiver.get_transaction_state(&blocked.transaction_id).confirmations, 1);
        assert_eq!(receiver.get_envelope_state(&blocked.envelope_id), EnvelopeState::None);
        assert!(handler.received().is_empty());

        // One second later: delivered.
        network.advance(1);
        let allowed = network
            .ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 0, b"after".to_vec())
            .unwrap();
        assert_eq!(receiver.get_envelope_state(&allowed.envelope_id), EnvelopeState::Delivered);

        // The blocked envelope goes through again under a new transaction.
        let envelope = registered_envelope(&network.ethereum, &blocked.envelope_id);
        let retried = network
            .ethereum
            .controller
            .retry_envelope(&network.ethereum.owner(), &envelope, 0)
            .unwrap();
        assert_eq!(retried.envelope_id, blocked.envelope_id);
        assert_ne!(retried.transaction_id, blocked.transaction_id);
        assert_eq!(receiver.get_envelope_state(&blocked.envelope_id), EnvelopeState::Delivered);

        let messages: Vec<_> = handler.received().into_iter().map(|m| m.message).collect();
        assert_eq!(messages, vec![b"after".to_vec(), b"at".to_vec()]);
    }

    #[test]
    fn test_failed_delivery_retried_by_anyone() {
        let (network, handler) = network(1, 1);
        handler.set_to_revert(true);

        let receipt = network
            .ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 0, b"retry me".to_vec())
            .unwrap();
        let receiver = network.polygon.controller.receiver();
        assert_eq!(receiver.get_envelope_state(&receipt.envelope_id), EnvelopeState::Confirmed);

        handler.set_to_revert(false);
        let envelope = registered_envelope(&network.ethereum, &receipt.envelope_id);
        let outcome = network.polygon.controller.deliver_envelope(&envelope).unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(receiver.get_envelope_state(&receipt.envelope_id), EnvelopeState::Delivered);
        assert_eq!(handler.received().len(), 1);

        assert_eq!(
            network.polygon.controller.deliver_envelope(&envelope).unwrap(),
            DeliveryOutcome::AlreadyDelivered
        );
    }

    #[test]
    fn test_unconfigured_origin_never_promotes() {
        let ethereum = Chain::new(chains::ETHEREUM).unwrap();
        let polygon = Chain::new(chains::POLYGON).unwrap();
        connect(
            &ethereum,
            &polygon,
            local_adapter(chains::ETHEREUM, 0),
            remote_adapter(chains::ETHEREUM, 0),
        )
        .unwrap();
        ethereum.approve_senders(&[SENDER]).unwrap();
        let handler = Arc::new(RecordingHandler::new());
        polygon.controller.bind_handler(DESTINATION, handler.clone());
        assert!(polygon.require_confirmations(chains::ETHEREUM, 0).is_err());

        let receipt = ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 0, b"idle".to_vec())
            .unwrap();

        let receiver = polygon.controller.receiver();
        assert_eq!(receiver.get_transaction_state(&receipt.transaction_id).confirmations, 1);
        assert_eq!(receiver.get_envelope_state(&receipt.envelope_id), EnvelopeState::None);
        assert!(handler.received().is_empty());
    }

    // =============================================================================
    // RELAYER VIEW
    // =============================================================================

    #[tokio::test]
    async fn test_relayer_sees_delivery_events() {
        let (network, _) = network(1, 1);
        let mut subscription = network
            .polygon
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Receiver]));

        let receipt = network
            .ethereum
            .controller
            .forward_message(&SENDER, chains::POLYGON, DESTINATION, 0, b"watched".to_vec())
            .unwrap();

        let first = timeout(Duration::from_secs(1), subscription.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            first,
            ProtocolEvent::TransactionReceived { confirmations: 1, .. }
        ));
        let second = timeout(Duration::from_secs(1), subscription.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            second,
            ProtocolEvent::EnvelopeDeliveryAttempted {
                envelope_id: receipt.envelope_id,
                envelope: registered_envelope(&network.ethereum, &receipt.envelope_id),
                is_delivered: true,
            }
        );
    }
}
