//! # Shared Types Crate
//!
//! Primitive types used by every cross-chain subsystem.
//!
//! ## Contents
//!
//! - **Primitives**: `Address`, `Hash`, `ChainId`, `Timestamp` and `U256`.
//! - **Chain context**: the ambient `now`, block number and chain id read at
//!   call time. There is no scheduler; time only advances through the context.
//! - **Access control**: owner and guardian checks guarding configuration
//!   entry points.

pub mod access;
pub mod chain_context;
pub mod primitives;

pub use access::{AccessControl, AccessError};
pub use chain_context::{ChainContext, ManualChainContext, SystemChainContext};
pub use primitives::*;
