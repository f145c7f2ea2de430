//! # Governance Messages
//!
//! Payloads exchanged between the governance chain and voting chains.
//!
//! Messages travelling to a voting machine are wrapped as
//! `abi.encode(uint8 messageType, bytes message)`. The leading tag keeps a
//! proposal and a vote with overlapping fields from ever decoding as each
//! other.

use crate::algorithms::abi::{self, ParamType, Token};
use crate::domain::errors::CodecError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// Governance message kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// Unset.
    Null = 0,
    /// Start voting on a proposal.
    Proposal = 1,
    /// A vote cast on the governance chain.
    Vote = 2,
}

impl TryFrom<u8> for MessageType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageType::Null),
            1 => Ok(MessageType::Proposal),
            2 => Ok(MessageType::Vote),
            other => Err(CodecError::UnknownMessageType(other)),
        }
    }
}

/// Wrap an inner message with its type tag.
pub fn encode_governance_message(message_type: MessageType, message: &[u8]) -> Vec<u8> {
    abi::encode(&[
        Token::Uint(U256::from(message_type as u8)),
        Token::Bytes(message.to_vec()),
    ])
}

/// Split a tagged message into its raw tag and inner bytes.
///
/// The tag is returned raw so callers can report unknown tags.
pub fn decode_governance_message(data: &[u8]) -> Result<(u8, Vec<u8>), CodecError> {
    let mut tokens = abi::decode(&[ParamType::Uint(8), ParamType::Bytes], data)?.into_iter();
    let tag = next_token(&mut tokens)?.into_uint()?.low_u32() as u8;
    let message = next_token(&mut tokens)?.into_bytes()?;
    Ok((tag, message))
}

fn next_token(tokens: &mut impl Iterator<Item = Token>) -> Result<Token, CodecError> {
    tokens
        .next()
        .ok_or_else(|| CodecError::UnexpectedToken("missing field".into()))
}

/// `Proposal(id, blockHash, votingDuration)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMessage {
    /// Governance proposal id.
    pub proposal_id: u64,
    /// Governance-chain block whose state votes are proven against.
    pub block_hash: Hash,
    /// Voting duration in seconds (uint24).
    pub voting_duration: u32,
}

impl ProposalMessage {
    /// Inner encoding, without the type tag.
    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            Token::Uint(U256::from(self.proposal_id)),
            Token::FixedBytes(self.block_hash),
            Token::Uint(U256::from(self.voting_duration)),
        ])
    }

    /// Tagged encoding ready to forward.
    pub fn encode_tagged(&self) -> Vec<u8> {
        encode_governance_message(MessageType::Proposal, &self.encode())
    }

    /// Decode the inner encoding.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut tokens = abi::decode(
            &[ParamType::Uint(256), ParamType::FixedBytes, ParamType::Uint(24)],
            data,
        )?
        .into_iter();
        Ok(Self {
            proposal_id: next_token(&mut tokens)?.into_u64()?,
            block_hash: next_token(&mut tokens)?.into_fixed_bytes()?,
            voting_duration: next_token(&mut tokens)?.into_uint()?.low_u32(),
        })
    }
}

/// A voting asset and the storage slot its balance is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VotingAssetWithSlot {
    /// Token contract on the governance chain.
    pub underlying_asset: Address,
    /// Mapping slot (uint128).
    pub slot: u128,
}

impl VotingAssetWithSlot {
    /// Create an asset/slot pair.
    pub fn new(underlying_asset: Address, slot: u128) -> Self {
        Self {
            underlying_asset,
            slot,
        }
    }
}

/// `Vote(proposalId, voter, support, votingAssetsWithSlot[])`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMessage {
    /// Governance proposal id.
    pub proposal_id: u64,
    /// Voter on the governance chain.
    pub voter: Address,
    /// For (true) or against.
    pub support: bool,
    /// Assets whose proofs will settle this vote.
    pub voting_assets_with_slot: Vec<VotingAssetWithSlot>,
}

impl VoteMessage {
    fn asset_type() -> ParamType {
        ParamType::Tuple(vec![ParamType::Address, ParamType::Uint(128)])
    }

    /// Inner encoding, without the type tag.
    pub fn encode(&self) -> Vec<u8> {
        let assets = self
            .voting_assets_with_slot
            .iter()
            .map(|a| {
                Token::Tuple(vec![
                    Token::Address(a.underlying_asset),
                    Token::Uint(U256::from(a.slot)),
                ])
            })
            .collect();
        abi::encode(&[
            Token::Uint(U256::from(self.proposal_id)),
            Token::Address(self.voter),
            Token::Bool(self.support),
            Token::Array(assets),
        ])
    }

    /// Tagged encoding ready to forward.
    pub fn encode_tagged(&self) -> Vec<u8> {
        encode_governance_message(MessageType::Vote, &self.encode())
    }

    /// Decode the inner encoding.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut tokens = abi::decode(
            &[
                ParamType::Uint(256),
                ParamType::Address,
                ParamType::Bool,
                ParamType::Array(Box::new(Self::asset_type())),
            ],
            data,
        )?
        .into_iter();

        let proposal_id = next_token(&mut tokens)?.into_u64()?;
        let voter = next_token(&mut tokens)?.into_address()?;
        let support = next_token(&mut tokens)?.into_bool()?;
        let mut voting_assets_with_slot = Vec::new();
        for item in next_token(&mut tokens)?.into_array()? {
            let mut fields = item.into_tuple()?.into_iter();
            let underlying_asset = next_token(&mut fields)?.into_address()?;
            let slot = next_token(&mut fields)?.into_uint()?.as_u128();
            voting_assets_with_slot.push(VotingAssetWithSlot::new(underlying_asset, slot));
        }

        Ok(Self {
            proposal_id,
            voter,
            support,
            voting_assets_with_slot,
        })
    }
}

/// Vote totals sent from a voting machine back to governance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResultMessage {
    /// Governance proposal id.
    pub proposal_id: u64,
    /// Total weighted votes in favour.
    pub for_votes: U256,
    /// Total weighted votes against.
    pub against_votes: U256,
}

impl ProposalResultMessage {
    /// `abi.encode(proposalId, forVotes, againstVotes)`.
    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            Token::Uint(U256::from(self.proposal_id)),
            Token::Uint(self.for_votes),
            Token::Uint(self.against_votes),
        ])
    }

    /// Decode a result message.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut tokens = abi::decode(
            &[ParamType::Uint(256), ParamType::Uint(256), ParamType::Uint(256)],
            data,
        )?
        .into_iter();
        Ok(Self {
            proposal_id: next_token(&mut tokens)?.into_u64()?,
            for_votes: next_token(&mut tokens)?.into_uint()?,
            against_votes: next_token(&mut tokens)?.into_uint()?,
        })
    }
}

/// Instruction sent by governance to a payloads controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadExecutionMessage {
    /// Payload id on the destination controller (uint40).
    pub payload_id: u64,
}

impl PayloadExecutionMessage {
    /// `abi.encode(uint40 payloadId)`.
    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[Token::Uint(U256::from(self.payload_id))])
    }

    /// Decode a payload execution message.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut tokens = abi::decode(&[ParamType::Uint(40)], data)?.into_iter();
        Ok(Self {
            payload_id: next_token(&mut tokens)?.into_u64()?,
        })
    }
}
