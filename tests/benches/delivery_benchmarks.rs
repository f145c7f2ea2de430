//! # Cross-Chain Delivery Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | cc-01 Envelope Codec | Envelope and transaction encoding, decoding, ids |
//! | cc-02 Proof Verifier | Storage proof verification |
//! | cc-04/05/06 Delivery | Forward on one chain, deliver on another |

use std::sync::Arc;
use std::time::Duration;

use cc_01_envelope_codec::{Envelope, Transaction};
use cc_02_proof_verifier::test_utils::StateFixture;
use cc_02_proof_verifier::{decode_proof, extract_slot_value, get_account_slot_hash};
use cc_03_adapter_registry::{
    BridgeAdapterConfigInput, ConfirmationInput, ReceiverBridgeAdapterConfigInput,
};
use cc_05_receiver::{DestinationHandler, HandlerError};
use cc_06_controller::{ControllerConfig, CrossChainController, InMemoryBridge};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_bus::NoopPublisher;
use shared_types::{address_from_u64, chains, Address, ChainId, ManualChainContext, U256};

const SENDER: Address = [0xC0; 20];
const DESTINATION: Address = [0xDE; 20];

fn envelope(size: usize) -> Envelope {
    Envelope {
        nonce: 42,
        origin: SENDER,
        destination: DESTINATION,
        origin_chain_id: chains::ETHEREUM,
        destination_chain_id: chains::POLYGON,
        message: vec![0xAB; size],
    }
}

// ============================================================================
// CC-01: Envelope Codec
// ============================================================================

fn bench_envelope_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-01-envelope-codec");

    for size in [32usize, 1024, 16 * 1024] {
        let envelope = envelope(size);
        let encoded_envelope = envelope.encode();
        let transaction = Transaction::new(7, encoded_envelope.clone());
        let encoded_transaction = transaction.encode();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("envelope_encode", size), &envelope, |b, e| {
            b.iter(|| black_box(e.encode()))
        });
        group.bench_with_input(
            BenchmarkId::new("envelope_decode", size),
            &encoded_envelope,
            |b, data| b.iter(|| black_box(Envelope::decode(data).is_ok())),
        );
        group.bench_with_input(
            BenchmarkId::new("transaction_id", size),
            &transaction,
            |b, t| b.iter(|| black_box(t.id())),
        );
        group.bench_with_input(
            BenchmarkId::new("transaction_decode", size),
            &encoded_transaction,
            |b, data| b.iter(|| black_box(Transaction::decode(data).is_ok())),
        );
    }

    group.finish();
}

// ============================================================================
// CC-02: Proof Verifier
// ============================================================================

fn bench_storage_proof(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-02-proof-verifier");
    let token = address_from_u64(0xAA01);

    for holders in [10u64, 1_000] {
        let mut state = StateFixture::new(1);
        for n in 0..holders {
            state.set_slot(
                token,
                get_account_slot_hash(&address_from_u64(n + 1), U256::zero()),
                U256::from(n + 1),
            );
        }
        let slot = get_account_slot_hash(&address_from_u64(1), U256::zero());
        let root = state.storage_root(&token);
        let encoded = state.storage_proof(&token, &slot);

        group.bench_with_input(
            BenchmarkId::new("verify_storage_proof", holders),
            &encoded,
            |b, encoded| {
                b.iter(|| {
                    let proof = decode_proof(encoded).unwrap_or_default();
                    black_box(extract_slot_value(&root, &slot, &proof).is_ok())
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// CC-06: Cross-Chain Delivery
// ============================================================================

fn chain(chain_id: ChainId) -> (Arc<CrossChainController>, ControllerConfig) {
    let config = ControllerConfig::for_testing(chain_id);
    let ctx = Arc::new(ManualChainContext::new(chain_id, 1_700_000_000));
    let controller = CrossChainController::new(config.clone(), ctx, Arc::new(NoopPublisher))
        .expect("controller config matches its chain");
    (Arc::new(controller), config)
}

/// Destination that accepts everything and keeps nothing.
struct Sink;

impl DestinationHandler for Sink {
    fn receive_cross_chain_message(
        &self,
        _origin_sender: &Address,
        _origin_chain_id: ChainId,
        _message: &[u8],
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Ethereum forwarding to Polygon through `bridges` in-memory bridges.
fn bridged(bridges: u64) -> (Arc<CrossChainController>, Arc<CrossChainController>) {
    let (ethereum, eth_config) = chain(chains::ETHEREUM);
    let (polygon, polygon_config) = chain(chains::POLYGON);
    ethereum.approve_senders(&eth_config.owner, &[SENDER]).unwrap();

    for n in 0..bridges {
        let local = address_from_u64(0xA1_00 + n);
        let remote = address_from_u64(0xB1_00 + n);
        ethereum
            .enable_bridge_adapters(
                &eth_config.owner,
                &[BridgeAdapterConfigInput {
                    current_chain_bridge_adapter: local,
                    destination_bridge_adapter: remote,
                    destination_chain_id: chains::POLYGON,
                }],
            )
            .unwrap();
        ethereum.bind_adapter(local, Arc::new(InMemoryBridge::new(chains::ETHEREUM, &polygon)));
        polygon
            .allow_receiver_bridge_adapters(
                &polygon_config.owner,
                &[ReceiverBridgeAdapterConfigInput {
                    bridge_adapter: remote,
                    chain_ids: vec![chains::ETHEREUM],
                }],
            )
            .unwrap();
    }
    polygon
        .update_confirmations(
            &polygon_config.owner,
            &[ConfirmationInput {
                chain_id: chains::ETHEREUM,
                required_confirmations: bridges as u8,
            }],
        )
        .unwrap();
    polygon.bind_handler(DESTINATION, Arc::new(Sink));
    (ethereum, polygon)
}

fn bench_cross_chain_delivery(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-06-cross-chain-delivery");
    group.measurement_time(Duration::from_secs(10));

    for bridges in [1u64, 2, 4] {
        let (ethereum, _polygon) = bridged(bridges);
        group.bench_function(BenchmarkId::new("forward_and_deliver", bridges), |b| {
            b.iter(|| {
                let receipt = ethereum
                    .forward_message(&SENDER, chains::POLYGON, DESTINATION, 2000, b"test message".to_vec())
                    .unwrap();
                black_box(receipt.successful_attempts())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_envelope_codec,
    bench_storage_proof,
    bench_cross_chain_delivery,
);
criterion_main!(benches);
