//! # Payloads Controller
//!
//! Destination of executed proposals on each execution chain. Records which
//! payloads governance asked it to run.

use std::collections::HashSet;
use std::sync::Arc;

use cc_01_envelope_codec::PayloadExecutionMessage;
use cc_05_receiver::{DestinationHandler, HandlerError};
use parking_lot::RwLock;
use shared_bus::{EventPublisher, ProtocolEvent};
use shared_types::{Address, ChainId};
use tracing::{debug, info};

use crate::config::PayloadsControllerConfig;
use crate::domain::GovernanceError;

/// Payloads controller.
pub struct PayloadsController {
    config: PayloadsControllerConfig,
    events: Arc<dyn EventPublisher>,
    executed: RwLock<HashSet<u64>>,
}

impl PayloadsController {
    /// Controller accepting instructions from the configured governance.
    pub fn new(config: PayloadsControllerConfig, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            config,
            events,
            executed: RwLock::new(HashSet::new()),
        }
    }

    /// Identity on the local controller.
    pub fn address(&self) -> Address {
        self.config.address
    }

    /// Whether governance asked for `payload_id` to run.
    pub fn is_payload_executed(&self, payload_id: u64) -> bool {
        self.executed.read().contains(&payload_id)
    }
}

impl DestinationHandler for PayloadsController {
    fn receive_cross_chain_message(
        &self,
        origin_sender: &Address,
        origin_chain_id: ChainId,
        message: &[u8],
    ) -> Result<(), HandlerError> {
        if *origin_sender != self.config.governance
            || origin_chain_id != self.config.governance_chain_id
        {
            return Err(HandlerError::new(GovernanceError::WrongMessageOrigin {
                sender: *origin_sender,
                chain_id: origin_chain_id,
            }));
        }

        let PayloadExecutionMessage { payload_id } =
            PayloadExecutionMessage::decode(message).map_err(HandlerError::new)?;

        if !self.executed.write().insert(payload_id) {
            debug!(payload_id, "[cc-07] Payload already recorded");
            return Ok(());
        }

        info!(payload_id, origin_chain_id, "[cc-07] Payload execution received");
        self.events.publish(ProtocolEvent::PayloadExecutionMessageReceived {
            origin_sender: *origin_sender,
            origin_chain_id,
            payload_id,
        });
        Ok(())
    }
}
