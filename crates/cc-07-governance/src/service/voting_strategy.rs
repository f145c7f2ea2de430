//! # Voting Strategy
//!
//! Turns proven storage values of the governance tokens into voting power.
//!
//! | Asset    | Slot | Layout                                              |
//! |----------|------|-----------------------------------------------------|
//! | AAVE     | 0    | packed delegation-aware balance                     |
//! | stkAAVE  | 0    | packed balance, divided by the exchange rate (81)   |
//! | aAAVE    | 52   | `uint120 balance \| uint8 delegationMode`           |
//! | aAAVE    | 64   | `uint72 delegatedProposition \| uint72 delegatedVoting` |

use std::sync::Arc;

use cc_02_proof_verifier::algorithms::extract_bits;
use cc_02_proof_verifier::{slot_key, DataWarehouseApi, DelegationMode, PackedDelegationBalance};
use shared_types::{Address, Hash, U256, ZERO_HASH};

use crate::config::VotingAssetsConfig;
use crate::domain::GovernanceError;

/// Balance mapping slot of AAVE and stkAAVE.
pub const BASE_BALANCE_SLOT: u128 = 0;

/// aAAVE balance mapping slot.
pub const A_AAVE_BASE_BALANCE_SLOT: u128 = 52;

/// aAAVE delegation state mapping slot.
pub const A_AAVE_DELEGATED_STATE_SLOT: u128 = 64;

/// stkAAVE exchange rate slot.
pub const STK_AAVE_EXCHANGE_RATE_SLOT: u128 = 81;

/// Delegated balances are stored divided by this factor.
pub fn power_scale_factor() -> U256 {
    U256::exp10(10)
}

/// Precision of the stkAAVE exchange rate.
pub fn exchange_rate_precision() -> U256 {
    U256::exp10(18)
}

/// Voting power computation over proven storage.
pub struct VotingStrategy {
    warehouse: Arc<dyn DataWarehouseApi>,
    assets: VotingAssetsConfig,
}

impl VotingStrategy {
    /// Strategy reading `warehouse` for the tokens in `assets`.
    pub fn new(warehouse: Arc<dyn DataWarehouseApi>, assets: VotingAssetsConfig) -> Self {
        Self { warehouse, assets }
    }

    /// Token contracts this strategy accepts.
    pub fn assets(&self) -> &VotingAssetsConfig {
        &self.assets
    }

    /// Warehouse holding the proven roots and slots.
    pub fn warehouse(&self) -> &Arc<dyn DataWarehouseApi> {
        &self.warehouse
    }

    /// Voting power carried by a proven slot value.
    ///
    /// Unknown asset/slot pairs carry none.
    pub fn get_voting_power(
        &self,
        asset: &Address,
        slot: u128,
        power: U256,
        block_hash: Hash,
    ) -> Result<U256, GovernanceError> {
        if *asset == self.assets.stk_aave && slot == BASE_BALANCE_SLOT {
            let rate = self.stk_aave_exchange_rate(block_hash);
            if rate.is_zero() {
                return Err(GovernanceError::MissingStkAaveExchangeRate);
            }
            return Ok(delegation_power(power) * exchange_rate_precision() / rate);
        }

        if *asset == self.assets.aave && slot == BASE_BALANCE_SLOT {
            return Ok(delegation_power(power));
        }

        if *asset == self.assets.a_aave {
            if slot == A_AAVE_DELEGATED_STATE_SLOT {
                return Ok(extract_bits(power, 72, 72) * power_scale_factor());
            }
            if slot == A_AAVE_BASE_BALANCE_SLOT {
                let mode = DelegationMode::from_bits(extract_bits(power, 120, 8).low_u32() as u8);
                if mode.voting_delegated() {
                    return Ok(U256::zero());
                }
                return Ok(extract_bits(power, 0, 120));
            }
        }

        Ok(U256::zero())
    }

    /// Checks that every root a vote against `block_hash` needs was proven.
    pub fn has_required_roots(&self, block_hash: Hash) -> Result<(), GovernanceError> {
        if self.warehouse.get_storage_roots(self.assets.aave, block_hash) == ZERO_HASH {
            return Err(GovernanceError::MissingAaveRoots);
        }
        if self.warehouse.get_storage_roots(self.assets.stk_aave, block_hash) == ZERO_HASH {
            return Err(GovernanceError::MissingStkAaveRoots);
        }
        if self.warehouse.get_storage_roots(self.assets.a_aave, block_hash) == ZERO_HASH {
            return Err(GovernanceError::MissingAAaveRoots);
        }
        if self.stk_aave_exchange_rate(block_hash).is_zero() {
            return Err(GovernanceError::MissingStkAaveExchangeRate);
        }
        Ok(())
    }

    /// Whether votes may be proven with `slot` of `asset`.
    pub fn is_token_slot_accepted(&self, asset: &Address, slot: u128) -> bool {
        self.get_voting_asset_config(asset)
            .map(|slots| slots.contains(&slot))
            .unwrap_or(false)
    }

    /// Accepted tokens.
    pub fn get_voting_asset_list(&self) -> Vec<Address> {
        vec![self.assets.aave, self.assets.stk_aave, self.assets.a_aave]
    }

    /// Accepted slots of `asset`, `None` for unknown tokens.
    pub fn get_voting_asset_config(&self, asset: &Address) -> Option<Vec<u128>> {
        if *asset == self.assets.aave || *asset == self.assets.stk_aave {
            Some(vec![BASE_BALANCE_SLOT])
        } else if *asset == self.assets.a_aave {
            Some(vec![A_AAVE_BASE_BALANCE_SLOT, A_AAVE_DELEGATED_STATE_SLOT])
        } else {
            None
        }
    }

    fn stk_aave_exchange_rate(&self, block_hash: Hash) -> U256 {
        let raw = self.warehouse.get_registered_slot(
            block_hash,
            self.assets.stk_aave,
            slot_key(U256::from(STK_AAVE_EXCHANGE_RATE_SLOT)),
        );
        extract_bits(raw, 0, 216)
    }
}

/// Own balance unless voting is delegated away, plus delegated voting power.
fn delegation_power(power: U256) -> U256 {
    let packed = PackedDelegationBalance::unpack(power);
    let own = if packed.delegation_mode.voting_delegated() {
        U256::zero()
    } else {
        packed.balance
    };
    own + packed.delegated_voting_balance * power_scale_factor()
}
