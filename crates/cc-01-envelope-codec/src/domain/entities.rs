//! # Domain Entities
//!
//! Envelopes and the transactions that carry them across bridges.

use crate::algorithms::abi::{self, ParamType, Token};
use crate::algorithms::keccak256;
use crate::domain::errors::CodecError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId, Hash};

/// Application-level cross-chain message.
///
/// Immutable once created. Identical fields with different nonces are
/// distinct envelopes with distinct ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Monotonic per-forwarder envelope counter.
    pub nonce: u64,
    /// Sender on the origin chain.
    pub origin: Address,
    /// Recipient on the destination chain.
    pub destination: Address,
    /// Chain the envelope was forwarded from.
    pub origin_chain_id: ChainId,
    /// Chain the envelope is addressed to.
    pub destination_chain_id: ChainId,
    /// Opaque payload.
    pub message: Vec<u8>,
}

/// Envelope bytes together with their id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedEnvelope {
    /// keccak256(data).
    pub id: Hash,
    /// ABI encoding of the envelope.
    pub data: Vec<u8>,
}

impl Envelope {
    fn param_type() -> ParamType {
        ParamType::Tuple(vec![
            ParamType::Uint(256),
            ParamType::Address,
            ParamType::Address,
            ParamType::Uint(256),
            ParamType::Uint(256),
            ParamType::Bytes,
        ])
    }

    fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Uint(U256::from(self.nonce)),
            Token::Address(self.origin),
            Token::Address(self.destination),
            Token::Uint(U256::from(self.origin_chain_id)),
            Token::Uint(U256::from(self.destination_chain_id)),
            Token::Bytes(self.message.clone()),
        ])
    }

    /// `abi.encode(envelope)`.
    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[self.to_token()])
    }

    /// Encode and hash in one step.
    pub fn encoded(&self) -> EncodedEnvelope {
        let data = self.encode();
        EncodedEnvelope {
            id: keccak256(&data),
            data,
        }
    }

    /// Content-derived envelope id.
    pub fn id(&self) -> Hash {
        keccak256(&self.encode())
    }

    /// Decode an ABI-encoded envelope.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut tokens = abi::decode(&[Self::param_type()], data)?;
        let fields = tokens
            .pop()
            .ok_or_else(|| CodecError::UnexpectedToken("empty envelope".into()))?
            .into_tuple()?;
        let mut fields = fields.into_iter();
        let mut next = || {
            fields
                .next()
                .ok_or_else(|| CodecError::UnexpectedToken("missing envelope field".into()))
        };

        Ok(Self {
            nonce: next()?.into_u64()?,
            origin: next()?.into_address()?,
            destination: next()?.into_address()?,
            origin_chain_id: next()?.into_u64()?,
            destination_chain_id: next()?.into_u64()?,
            message: next()?.into_bytes()?,
        })
    }
}

/// One forwarding attempt of an envelope.
///
/// Each retry mints a new transaction nonce and therefore a new id, which lets
/// receivers tell a fresh retransmission from a duplicate relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Monotonic per-forwarder transaction counter.
    pub nonce: u64,
    /// ABI-encoded envelope.
    pub encoded_envelope: Vec<u8>,
}

/// Transaction bytes together with their id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedTransaction {
    /// keccak256(data).
    pub id: Hash,
    /// ABI encoding of the transaction.
    pub data: Vec<u8>,
}

impl Transaction {
    /// Wrap an already encoded envelope.
    pub fn new(nonce: u64, encoded_envelope: Vec<u8>) -> Self {
        Self {
            nonce,
            encoded_envelope,
        }
    }

    fn param_type() -> ParamType {
        ParamType::Tuple(vec![ParamType::Uint(256), ParamType::Bytes])
    }

    /// `abi.encode(transaction)`.
    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[Token::Tuple(vec![
            Token::Uint(U256::from(self.nonce)),
            Token::Bytes(self.encoded_envelope.clone()),
        ])])
    }

    /// Encode and hash in one step.
    pub fn encoded(&self) -> EncodedTransaction {
        let data = self.encode();
        EncodedTransaction {
            id: keccak256(&data),
            data,
        }
    }

    /// Content-derived transaction id.
    pub fn id(&self) -> Hash {
        keccak256(&self.encode())
    }

    /// Decode an ABI-encoded transaction.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut tokens = abi::decode(&[Self::param_type()], data)?;
        let mut fields = tokens
            .pop()
            .ok_or_else(|| CodecError::UnexpectedToken("empty transaction".into()))?
            .into_tuple()?
            .into_iter();
        let nonce = fields
            .next()
            .ok_or_else(|| CodecError::UnexpectedToken("missing nonce".into()))?
            .into_u64()?;
        let encoded_envelope = fields
            .next()
            .ok_or_else(|| CodecError::UnexpectedToken("missing envelope".into()))?
            .into_bytes()?;
        Ok(Self {
            nonce,
            encoded_envelope,
        })
    }

    /// Decode the wrapped envelope.
    pub fn envelope(&self) -> Result<Envelope, CodecError> {
        Envelope::decode(&self.encoded_envelope)
    }

    /// Id of the wrapped envelope, without decoding it.
    pub fn envelope_id(&self) -> Hash {
        keccak256(&self.encoded_envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_envelope(nonce: u64) -> Envelope {
        Envelope {
            nonce,
            origin: [0xaa; 20],
            destination: [0xbb; 20],
            origin_chain_id: 1,
            destination_chain_id: 137,
            message: b"test message".to_vec(),
        }
    }

    #[test]
    fn test_envelope_layout() {
        let data = sample_envelope(0).encode();
        // offset word, 5 static words, bytes offset, length, one data word
        assert_eq!(data.len(), 9 * 32);
        assert_eq!(data[31], 0x20);
        assert!(data[32..64].iter().all(|b| *b == 0));
        assert_eq!(&data[64 + 12..96], &[0xaa; 20]);
        assert_eq!(&data[96 + 12..128], &[0xbb; 20]);
        assert_eq!(data[159], 1);
        assert_eq!(data[191], 137);
        // bytes offset is relative to the tuple start: 6 head words
        assert_eq!(data[223], 0xc0);
        assert_eq!(data[255], 12);
        assert_eq!(&data[256..268], b"test message");
    }

    #[test]
    fn test_envelope_id_matches_encoded() {
        let envelope = sample_envelope(3);
        let encoded = envelope.encoded();
        assert_eq!(encoded.id, envelope.id());
        assert_eq!(encoded.id, keccak256(&encoded.data));
    }

    #[test]
    fn test_transaction_wraps_envelope() {
        let envelope = sample_envelope(0);
        let tx = Transaction::new(0, envelope.encode());
        let decoded = Transaction::decode(&tx.encode()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.envelope().unwrap(), envelope);
        assert_eq!(decoded.envelope_id(), envelope.id());
    }

    #[test]
    fn test_retry_mints_new_transaction_id() {
        let envelope = sample_envelope(0).encode();
        let first = Transaction::new(0, envelope.clone());
        let retry = Transaction::new(1, envelope);
        assert_ne!(first.id(), retry.id());
        assert_eq!(first.envelope_id(), retry.envelope_id());
    }

    #[test]
    fn test_transaction_decode_garbage_fails() {
        assert!(Transaction::decode(&[0u8; 47]).is_err());
    }

    #[test]
    fn test_envelope_and_transaction_ids_differ() {
        // Same bytes under two structures never share an id: the transaction
        // preimage always includes its nonce and the envelope offset.
        let envelope = sample_envelope(0);
        let tx = Transaction::new(0, envelope.encode());
        assert_ne!(envelope.id(), tx.id());
    }

    proptest! {
        #[test]
        fn prop_envelope_decode_inverts_encode(
            nonce in any::<u64>(),
            origin in any::<[u8; 20]>(),
            destination in any::<[u8; 20]>(),
            origin_chain_id in any::<u64>(),
            destination_chain_id in any::<u64>(),
            message in proptest::collection::vec(any::<u8>(), 0..200),
        ) {
            let envelope = Envelope {
                nonce,
                origin,
                destination,
                origin_chain_id,
                destination_chain_id,
                message,
            };
            prop_assert_eq!(Envelope::decode(&envelope.encode()).unwrap(), envelope);
        }

        #[test]
        fn prop_distinct_nonces_distinct_ids(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            prop_assert_ne!(sample_envelope(a).id(), sample_envelope(b).id());
        }
    }
}
