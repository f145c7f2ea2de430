//! Bridge adapter connecting two in-process controllers.
//!
//! Stands in for a real bridge in simulations: the destination adapter
//! address configured on the sending side is the identity the message
//! arrives under on the receiving side.

use std::sync::{Arc, Weak};

use cc_04_forwarder::{AdapterResult, BridgeAdapter};
use shared_types::{to_hex, Address, ChainId};
use tracing::debug;

use crate::service::CrossChainController;

/// In-memory bridge to one remote controller.
pub struct InMemoryBridge {
    origin_chain_id: ChainId,
    remote: Weak<CrossChainController>,
}

impl InMemoryBridge {
    /// Bridge from `origin_chain_id` to `remote`.
    ///
    /// Holds the remote weakly so two controllers bridged both ways can
    /// still be dropped.
    pub fn new(origin_chain_id: ChainId, remote: &Arc<CrossChainController>) -> Self {
        Self {
            origin_chain_id,
            remote: Arc::downgrade(remote),
        }
    }
}

impl BridgeAdapter for InMemoryBridge {
    fn forward_message(
        &self,
        receiver: &Address,
        _gas_limit: u64,
        destination_chain_id: ChainId,
        message: &[u8],
    ) -> AdapterResult {
        let Some(remote) = self.remote.upgrade() else {
            return AdapterResult::failed("remote chain unavailable");
        };
        if remote.chain_id() != destination_chain_id {
            return AdapterResult::failed(format!(
                "bridge reaches chain {}, not {}",
                remote.chain_id(),
                destination_chain_id
            ));
        }

        debug!(
            receiver = %to_hex(receiver),
            origin_chain_id = self.origin_chain_id,
            destination_chain_id,
            "[cc-06] Bridging transaction"
        );
        match remote.receive_cross_chain_message(receiver, message, self.origin_chain_id) {
            Ok(_) => AdapterResult::ok(Vec::new()),
            Err(error) => AdapterResult::failed(error.to_string()),
        }
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
