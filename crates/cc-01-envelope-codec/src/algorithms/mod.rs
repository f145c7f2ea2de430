//! # Algorithms
//!
//! ABI word codec and hashing.

pub mod abi;
pub mod hashing;

pub use abi::{decode, encode, ParamType, Token};
pub use hashing::keccak256;
