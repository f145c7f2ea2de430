//! # Outbound Ports
//!
//! Consumers of delivered envelope payloads.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{Address, ChainId};

use crate::domain::HandlerError;

/// Destination handler - outbound port.
///
/// May be called more than once for the same envelope after a failed
/// attempt, so implementations must guard against replays themselves.
pub trait DestinationHandler: Send + Sync {
    /// Consume a delivered payload.
    fn receive_cross_chain_message(
        &self,
        origin_sender: &Address,
        origin_chain_id: ChainId,
        message: &[u8],
    ) -> Result<(), HandlerError>;
}

/// Handlers bound to envelope destination addresses.
#[derive(Default)]
pub struct HandlerBook {
    handlers: RwLock<HashMap<Address, Arc<dyn DestinationHandler>>>,
}

impl HandlerBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` as the destination at `address`.
    pub fn bind(&self, address: Address, handler: Arc<dyn DestinationHandler>) {
        self.handlers.write().insert(address, handler);
    }

    /// Handler at `address`.
    pub fn get(&self, address: &Address) -> Option<Arc<dyn DestinationHandler>> {
        self.handlers.read().get(address).cloned()
    }

    /// Deliver to the handler at `destination`. Unbound is a failure.
    pub fn deliver(
        &self,
        destination: &Address,
        origin_sender: &Address,
        origin_chain_id: ChainId,
        message: &[u8],
    ) -> Result<(), HandlerError> {
        let handler = self
            .get(destination)
            .ok_or_else(|| HandlerError::new("no handler bound to destination"))?;
        handler.receive_cross_chain_message(origin_sender, origin_chain_id, message)
    }
}
