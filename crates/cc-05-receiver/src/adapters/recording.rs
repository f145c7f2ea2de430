//! Destination handler that records what it receives.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use shared_types::{Address, ChainId};

use crate::domain::HandlerError;
use crate::ports::DestinationHandler;

/// A payload seen by [`RecordingHandler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Sender on the origin chain.
    pub origin_sender: Address,
    /// Origin chain.
    pub origin_chain_id: ChainId,
    /// Payload.
    pub message: Vec<u8>,
}

/// Records accepted payloads; can be told to reject.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    to_revert: AtomicBool,
    received: Mutex<Vec<ReceivedMessage>>,
}

impl RecordingHandler {
    /// Accepting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject (true) or accept (false) subsequent deliveries.
    pub fn set_to_revert(&self, to_revert: bool) {
        self.to_revert.store(to_revert, Ordering::SeqCst);
    }

    /// Accepted payloads.
    pub fn received(&self) -> Vec<ReceivedMessage> {
        self.received.lock().clone()
    }
}

impl DestinationHandler for RecordingHandler {
    fn receive_cross_chain_message(
        &self,
        origin_sender: &Address,
        origin_chain_id: ChainId,
        message: &[u8],
    ) -> Result<(), HandlerError> {
        if self.to_revert.load(Ordering::SeqCst) {
            return Err(HandlerError::new("handler set to revert"));
        }
        self.received.lock().push(ReceivedMessage {
            origin_sender: *origin_sender,
            origin_chain_id,
            message: message.to_vec(),
        });
        Ok(())
    }
}
