//! # Domain Module
//!
//! Proof values, nibble paths and errors.

pub mod entities;
pub mod errors;
pub mod nibbles;

pub use entities::*;
pub use errors::*;
pub use nibbles::Nibbles;
