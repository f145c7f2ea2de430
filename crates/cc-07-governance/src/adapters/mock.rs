//! Mock proposition power and recording forwarder.

use std::collections::HashMap;

use cc_01_envelope_codec::keccak256;
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, ChainId, Hash, U256};

use crate::domain::GovernanceError;
use crate::ports::{MessageForwarder, PropositionPowerStrategy};

/// Proposition power strategy with settable answers.
///
/// Every user gets the default power unless a per-user override is set.
#[derive(Debug)]
pub struct MockPowerStrategy {
    address: Address,
    default_power: RwLock<U256>,
    overrides: RwLock<HashMap<Address, U256>>,
}

impl MockPowerStrategy {
    /// Strategy at `address` reporting zero power.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            default_power: RwLock::new(U256::zero()),
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Power reported for every user without an override.
    pub fn set_full_proposition_power(&self, power: U256) {
        *self.default_power.write() = power;
    }

    /// Power reported for `user`.
    pub fn set_power_of(&self, user: Address, power: U256) {
        self.overrides.write().insert(user, power);
    }
}

impl PropositionPowerStrategy for MockPowerStrategy {
    fn address(&self) -> Address {
        self.address
    }

    fn get_full_proposition_power(&self, user: &Address) -> U256 {
        self.overrides
            .read()
            .get(user)
            .copied()
            .unwrap_or_else(|| *self.default_power.read())
    }
}

/// A message seen by [`RecordingForwarder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardedMessage {
    /// Sender identity.
    pub sender: Address,
    /// Destination chain.
    pub destination_chain_id: ChainId,
    /// Destination handler.
    pub destination: Address,
    /// Gas limit.
    pub gas_limit: u64,
    /// Message bytes.
    pub message: Vec<u8>,
}

/// Forwarder that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingForwarder {
    sent: Mutex<Vec<ForwardedMessage>>,
    failure: Mutex<Option<GovernanceError>>,
    unroutable: Mutex<HashMap<ChainId, GovernanceError>>,
}

impl RecordingForwarder {
    /// Forwarder accepting every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent forward with `error`, or accept again with `None`.
    pub fn set_failure(&self, error: Option<GovernanceError>) {
        *self.failure.lock() = error;
    }

    /// Refuse routes to `chain_id` with `error`, or route again with `None`.
    pub fn set_unroutable(&self, chain_id: ChainId, error: Option<GovernanceError>) {
        let mut unroutable = self.unroutable.lock();
        match error {
            Some(error) => unroutable.insert(chain_id, error),
            None => unroutable.remove(&chain_id),
        };
    }

    /// Messages forwarded so far.
    pub fn sent(&self) -> Vec<ForwardedMessage> {
        self.sent.lock().clone()
    }
}

impl MessageForwarder for RecordingForwarder {
    fn forward_message(
        &self,
        sender: &Address,
        destination_chain_id: ChainId,
        destination: Address,
        gas_limit: u64,
        message: Vec<u8>,
    ) -> Result<Hash, GovernanceError> {
        self.check_route(sender, destination_chain_id)?;
        let id = keccak256(&message);
        self.sent.lock().push(ForwardedMessage {
            sender: *sender,
            destination_chain_id,
            destination,
            gas_limit,
            message,
        });
        Ok(id)
    }

    fn check_route(&self, _sender: &Address, destination_chain_id: ChainId) -> Result<(), GovernanceError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        match self.unroutable.lock().get(&destination_chain_id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
