//! # Domain Errors
//!
//! Decoding failures. Encoding is infallible.

use thiserror::Error;

/// Codec error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input ended before a word or body could be read.
    #[error("Unexpected end of data: needed {needed} bytes, have {available}")]
    UnexpectedEnd {
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        available: usize,
    },

    /// An offset or length word points outside the input.
    #[error("Offset out of bounds: {offset}")]
    OffsetOutOfBounds {
        /// Offending offset.
        offset: usize,
    },

    /// Value does not fit the declared integer width.
    #[error("Value does not fit in uint{bits}")]
    ValueOutOfRange {
        /// Declared width.
        bits: usize,
    },

    /// Non-zero padding in an address word.
    #[error("Invalid address padding")]
    InvalidPadding,

    /// Bool word other than 0 or 1.
    #[error("Invalid bool encoding")]
    InvalidBool,

    /// Token shape differs from the expected structure.
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    /// Governance message carries an unknown type tag.
    #[error("Unknown message type: {0}")]
    UnknownMessageType(u8),
}
