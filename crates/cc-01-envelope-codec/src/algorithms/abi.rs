//! # ABI Word Codec
//!
//! Ethereum contract ABI encoding for the subset of types the protocol uses.
//!
//! A sequence of values is laid out as a head of 32-byte words followed by a
//! tail. Static values sit in the head; dynamic values (`bytes`, arrays and
//! tuples containing either) leave an offset in the head, relative to the
//! start of the enclosing sequence, and their body in the tail.

use crate::domain::CodecError;
use primitive_types::U256;
use shared_types::{Address, Hash};

/// Word size in bytes.
pub const WORD: usize = 32;

/// A decoded or to-be-encoded ABI value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// `uintN`.
    Uint(U256),
    /// `address`.
    Address(Address),
    /// `bool`.
    Bool(bool),
    /// `bytes32`.
    FixedBytes(Hash),
    /// `bytes`.
    Bytes(Vec<u8>),
    /// `T[]`.
    Array(Vec<Token>),
    /// `(T1, T2, ...)`.
    Tuple(Vec<Token>),
}

/// Expected shape of an ABI value, used when decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// `uintN` with N bits (8..=256).
    Uint(usize),
    /// `address`.
    Address,
    /// `bool`.
    Bool,
    /// `bytes32`.
    FixedBytes,
    /// `bytes`.
    Bytes,
    /// `T[]`.
    Array(Box<ParamType>),
    /// `(T1, T2, ...)`.
    Tuple(Vec<ParamType>),
}

impl Token {
    /// Dynamic values are encoded out of line behind an offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Token::Bytes(_) | Token::Array(_) => true,
            Token::Tuple(items) => items.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    /// Unwrap a `Uint`.
    pub fn into_uint(self) -> Result<U256, CodecError> {
        match self {
            Token::Uint(v) => Ok(v),
            other => Err(CodecError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    /// Unwrap a `Uint` that must fit in a u64.
    pub fn into_u64(self) -> Result<u64, CodecError> {
        let value = self.into_uint()?;
        if value > U256::from(u64::MAX) {
            return Err(CodecError::ValueOutOfRange { bits: 64 });
        }
        Ok(value.low_u64())
    }

    /// Unwrap an `Address`.
    pub fn into_address(self) -> Result<Address, CodecError> {
        match self {
            Token::Address(a) => Ok(a),
            other => Err(CodecError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    /// Unwrap a `Bool`.
    pub fn into_bool(self) -> Result<bool, CodecError> {
        match self {
            Token::Bool(b) => Ok(b),
            other => Err(CodecError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    /// Unwrap a `FixedBytes`.
    pub fn into_fixed_bytes(self) -> Result<Hash, CodecError> {
        match self {
            Token::FixedBytes(h) => Ok(h),
            other => Err(CodecError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    /// Unwrap `Bytes`.
    pub fn into_bytes(self) -> Result<Vec<u8>, CodecError> {
        match self {
            Token::Bytes(b) => Ok(b),
            other => Err(CodecError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    /// Unwrap an `Array`.
    pub fn into_array(self) -> Result<Vec<Token>, CodecError> {
        match self {
            Token::Array(items) => Ok(items),
            other => Err(CodecError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    /// Unwrap a `Tuple`.
    pub fn into_tuple(self) -> Result<Vec<Token>, CodecError> {
        match self {
            Token::Tuple(items) => Ok(items),
            other => Err(CodecError::UnexpectedToken(format!("{other:?}"))),
        }
    }
}

impl ParamType {
    /// Mirrors [`Token::is_dynamic`].
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::Array(_) => true,
            ParamType::Tuple(items) => items.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Head size of a static type.
    fn static_size(&self) -> usize {
        match self {
            ParamType::Tuple(items) => items.iter().map(ParamType::static_size).sum(),
            _ => WORD,
        }
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a sequence of tokens (the argument list of `abi.encode`).
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    encode_sequence(tokens)
}

fn head_size(token: &Token) -> usize {
    if token.is_dynamic() {
        return WORD;
    }
    match token {
        Token::Tuple(items) => items.iter().map(head_size).sum(),
        _ => WORD,
    }
}

fn encode_sequence(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }

    head.extend(tail);
    head
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Uint(v) => {
            let mut word = [0u8; WORD];
            v.to_big_endian(&mut word);
            word.to_vec()
        }
        Token::Address(a) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(a);
            word.to_vec()
        }
        Token::Bool(b) => {
            let mut word = [0u8; WORD];
            word[31] = u8::from(*b);
            word.to_vec()
        }
        Token::FixedBytes(h) => h.to_vec(),
        Token::Bytes(data) => {
            let mut out = usize_word(data.len()).to_vec();
            out.extend_from_slice(data);
            out.resize(out.len() + padding(data.len()), 0);
            out
        }
        Token::Array(items) => {
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_sequence(items));
            out
        }
        Token::Tuple(items) => encode_sequence(items),
    }
}

fn usize_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn padding(len: usize) -> usize {
    (WORD - len % WORD) % WORD
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode `data` as a sequence of the given types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, CodecError> {
    decode_sequence(types, data, 0)
}

fn decode_sequence(
    types: &[ParamType],
    data: &[u8],
    base: usize,
) -> Result<Vec<Token>, CodecError> {
    let mut cursor = base;
    let mut tokens = Vec::with_capacity(types.len());

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            let start = base
                .checked_add(offset)
                .ok_or(CodecError::OffsetOutOfBounds { offset })?;
            tokens.push(decode_dynamic(ty, data, start)?);
            cursor += WORD;
        } else {
            tokens.push(decode_static(ty, data, cursor)?);
            cursor += ty.static_size();
        }
    }

    Ok(tokens)
}

fn decode_static(ty: &ParamType, data: &[u8], at: usize) -> Result<Token, CodecError> {
    match ty {
        ParamType::Uint(bits) => {
            let word = read_word(data, at)?;
            let value = U256::from_big_endian(word);
            if *bits < 256 && value >> *bits != U256::zero() {
                return Err(CodecError::ValueOutOfRange { bits: *bits });
            }
            Ok(Token::Uint(value))
        }
        ParamType::Address => {
            let word = read_word(data, at)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(CodecError::InvalidPadding);
            }
            let mut address = [0u8; 20];
            address.copy_from_slice(&word[12..]);
            Ok(Token::Address(address))
        }
        ParamType::Bool => {
            let word = read_word(data, at)?;
            if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                return Err(CodecError::InvalidBool);
            }
            Ok(Token::Bool(word[31] == 1))
        }
        ParamType::FixedBytes => {
            let word = read_word(data, at)?;
            let mut hash = [0u8; WORD];
            hash.copy_from_slice(word);
            Ok(Token::FixedBytes(hash))
        }
        ParamType::Tuple(items) => {
            let mut cursor = at;
            let mut tokens = Vec::with_capacity(items.len());
            for item in items {
                tokens.push(decode_static(item, data, cursor)?);
                cursor += item.static_size();
            }
            Ok(Token::Tuple(tokens))
        }
        ParamType::Bytes | ParamType::Array(_) => decode_dynamic(ty, data, at),
    }
}

fn decode_dynamic(ty: &ParamType, data: &[u8], start: usize) -> Result<Token, CodecError> {
    match ty {
        ParamType::Bytes => {
            let len = read_usize(data, start)?;
            let begin = start + WORD;
            let end = begin
                .checked_add(len)
                .filter(|end| *end <= data.len())
                .ok_or(CodecError::UnexpectedEnd {
                    needed: begin.saturating_add(len),
                    available: data.len(),
                })?;
            Ok(Token::Bytes(data[begin..end].to_vec()))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, start)?;
            let body = start + WORD;
            // Every element takes at least one head word.
            if len > data.len().saturating_sub(body) / WORD {
                return Err(CodecError::UnexpectedEnd {
                    needed: body.saturating_add(len.saturating_mul(WORD)),
                    available: data.len(),
                });
            }
            let types = vec![(**inner).clone(); len];
            Ok(Token::Array(decode_sequence(&types, data, body)?))
        }
        ParamType::Tuple(items) => Ok(Token::Tuple(decode_sequence(items, data, start)?)),
        _ => decode_static(ty, data, start),
    }
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], CodecError> {
    let end = at.checked_add(WORD).filter(|end| *end <= data.len());
    match end {
        Some(end) => Ok(&data[at..end]),
        None => Err(CodecError::UnexpectedEnd {
            needed: at.saturating_add(WORD),
            available: data.len(),
        }),
    }
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, CodecError> {
    let word = read_word(data, at)?;
    let value = U256::from_big_endian(word);
    if value > U256::from(data.len()) {
        return Err(CodecError::OffsetOutOfBounds {
            offset: if value > U256::from(usize::MAX) {
                usize::MAX
            } else {
                value.as_usize()
            },
        });
    }
    Ok(value.as_usize())
}
