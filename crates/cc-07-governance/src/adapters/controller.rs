//! The cross-chain controller as a [`MessageForwarder`].

use cc_06_controller::CrossChainController;
use shared_types::{Address, ChainId, Hash};

use crate::domain::GovernanceError;
use crate::ports::MessageForwarder;

impl MessageForwarder for CrossChainController {
    fn forward_message(
        &self,
        sender: &Address,
        destination_chain_id: ChainId,
        destination: Address,
        gas_limit: u64,
        message: Vec<u8>,
    ) -> Result<Hash, GovernanceError> {
        let receipt = CrossChainController::forward_message(
            self,
            sender,
            destination_chain_id,
            destination,
            gas_limit,
            message,
        )?;
        Ok(receipt.envelope_id)
    }

    fn check_route(&self, sender: &Address, destination_chain_id: ChainId) -> Result<(), GovernanceError> {
        Ok(CrossChainController::check_route(self, sender, destination_chain_id)?)
    }
}
