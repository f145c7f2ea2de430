//! # Slot Utilities
//!
//! Solidity storage layout helpers: mapping slot hashes and packed balances.

use cc_01_envelope_codec::{encode, keccak256, Token};
use primitive_types::U256;
use shared_types::{u256_to_bytes, Address, Hash};

/// Slot of `mapping(address => T)` at `mapping_slot` for `holder`.
///
/// `keccak256(abi.encode(holder, mappingSlot))`.
pub fn get_account_slot_hash(holder: &Address, mapping_slot: U256) -> Hash {
    keccak256(&encode(&[Token::Address(*holder), Token::Uint(mapping_slot)]))
}

/// Slot of `mapping(address => mapping(address => T))` for `outer`, `inner`.
pub fn get_nested_account_slot_hash(outer: &Address, inner: &Address, mapping_slot: U256) -> Hash {
    let outer_slot = get_account_slot_hash(outer, mapping_slot);
    keccak256(&encode(&[
        Token::Address(*inner),
        Token::FixedBytes(outer_slot),
    ]))
}

/// Slot index as a 32-byte key.
pub fn slot_key(slot: U256) -> Hash {
    u256_to_bytes(slot)
}

/// Bits `[offset, offset + width)` of a packed word.
pub fn extract_bits(word: U256, offset: usize, width: usize) -> U256 {
    if width >= 256 {
        return word >> offset;
    }
    (word >> offset) & ((U256::one() << width) - 1)
}

/// How an account delegates its governance power.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelegationMode {
    /// Nothing delegated.
    NoDelegation,
    /// Voting power delegated away.
    VotingDelegated,
    /// Proposition power delegated away.
    PropositionDelegated,
    /// Both powers delegated away.
    FullPowerDelegated,
}

impl DelegationMode {
    /// Decode the 8-bit mode field. Unknown values read as no delegation.
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::VotingDelegated,
            2 => Self::PropositionDelegated,
            3 => Self::FullPowerDelegated,
            _ => Self::NoDelegation,
        }
    }

    /// True when the holder's own voting power belongs to a delegatee.
    pub fn voting_delegated(self) -> bool {
        matches!(self, Self::VotingDelegated | Self::FullPowerDelegated)
    }
}

/// Delegation-aware balance word:
/// `uint104 balance | uint72 delegatedPropositionBalance |
/// uint72 delegatedVotingBalance | uint8 delegationMode`, low bits first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedDelegationBalance {
    /// Own token balance.
    pub balance: U256,
    /// Proposition power delegated to the holder, divided by 1e10.
    pub delegated_proposition_balance: U256,
    /// Voting power delegated to the holder, divided by 1e10.
    pub delegated_voting_balance: U256,
    /// Delegation state.
    pub delegation_mode: DelegationMode,
}

impl PackedDelegationBalance {
    /// Unpack a raw slot value.
    pub fn unpack(word: U256) -> Self {
        Self {
            balance: extract_bits(word, 0, 104),
            delegated_proposition_balance: extract_bits(word, 104, 72),
            delegated_voting_balance: extract_bits(word, 176, 72),
            delegation_mode: DelegationMode::from_bits(extract_bits(word, 248, 8).low_u32() as u8),
        }
    }

    /// Inverse of [`unpack`](Self::unpack), used to build fixtures.
    pub fn pack(&self) -> U256 {
        let mode: u8 = match self.delegation_mode {
            DelegationMode::NoDelegation => 0,
            DelegationMode::VotingDelegated => 1,
            DelegationMode::PropositionDelegated => 2,
            DelegationMode::FullPowerDelegated => 3,
        };
        self.balance
            | (self.delegated_proposition_balance << 104)
            | (self.delegated_voting_balance << 176)
            | (U256::from(mode) << 248)
    }
}
