//! Adapter for envelopes whose destination is on the sending chain.
//!
//! Skips confirmation counting and hands the payload straight to the local
//! destination handler.

use std::sync::Arc;

use cc_01_envelope_codec::{encode, Token, Transaction};
use cc_04_forwarder::{AdapterResult, BridgeAdapter};
use cc_05_receiver::HandlerBook;
use shared_types::{to_hex, Address, ChainId, U256};
use tracing::{debug, warn};

/// Same-chain bridge adapter.
pub struct SameChainAdapter {
    handlers: Arc<HandlerBook>,
}

impl SameChainAdapter {
    /// Deliver through `handlers`.
    pub fn new(handlers: Arc<HandlerBook>) -> Self {
        Self { handlers }
    }
}

impl BridgeAdapter for SameChainAdapter {
    fn forward_message(
        &self,
        _receiver: &Address,
        _gas_limit: u64,
        _destination_chain_id: ChainId,
        message: &[u8],
    ) -> AdapterResult {
        let envelope = match Transaction::decode(message).and_then(|tx| tx.envelope()) {
            Ok(envelope) => envelope,
            Err(error) => return AdapterResult::failed(error.to_string()),
        };

        match self.handlers.deliver(
            &envelope.destination,
            &envelope.origin,
            envelope.origin_chain_id,
            &envelope.message,
        ) {
            Ok(()) => {
                debug!(destination = %to_hex(&envelope.destination), "[cc-06] Same-chain delivery");
                AdapterResult::ok(encode(&[Token::Tuple(vec![
                    Token::Address(envelope.destination),
                    Token::Uint(U256::zero()),
                ])]))
            }
            Err(error) => {
                warn!(
                    destination = %to_hex(&envelope.destination),
                    %error,
                    "[cc-06] Same-chain delivery failed"
                );
                AdapterResult::failed(error.0)
            }
        }
    }

    fn name(&self) -> &str {
        "same-chain"
    }
}
