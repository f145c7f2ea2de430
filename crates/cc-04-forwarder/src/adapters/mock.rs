//! Recording bridge adapter.

use parking_lot::Mutex;
use shared_types::{Address, ChainId};

use crate::domain::AdapterResult;
use crate::ports::BridgeAdapter;

/// A call seen by [`MockBridgeAdapter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardedCall {
    /// Destination adapter.
    pub receiver: Address,
    /// Gas limit passed through.
    pub gas_limit: u64,
    /// Destination chain.
    pub destination_chain_id: ChainId,
    /// Encoded transaction.
    pub message: Vec<u8>,
}

/// Adapter that records every send and answers with a fixed result.
#[derive(Debug)]
pub struct MockBridgeAdapter {
    result: Mutex<AdapterResult>,
    calls: Mutex<Vec<ForwardedCall>>,
}

impl MockBridgeAdapter {
    /// Adapter that accepts every send and returns `[0x00]`.
    pub fn new() -> Self {
        Self::with_result(AdapterResult::ok(vec![0x00]))
    }

    /// Adapter that rejects every send with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self::with_result(AdapterResult::failed(reason.as_bytes()))
    }

    /// Adapter answering with `result`.
    pub fn with_result(result: AdapterResult) -> Self {
        Self {
            result: Mutex::new(result),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Change the answer for subsequent sends.
    pub fn set_result(&self, result: AdapterResult) {
        *self.result.lock() = result;
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<ForwardedCall> {
        self.calls.lock().clone()
    }
}

impl Default for MockBridgeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeAdapter for MockBridgeAdapter {
    fn forward_message(
        &self,
        receiver: &Address,
        gas_limit: u64,
        destination_chain_id: ChainId,
        message: &[u8],
    ) -> AdapterResult {
        self.calls.lock().push(ForwardedCall {
            receiver: *receiver,
            gas_limit,
            destination_chain_id,
            message: message.to_vec(),
        });
        self.result.lock().clone()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
