//! # Domain Module
//!
//! Envelope, transaction and governance message types.

pub mod entities;
pub mod errors;
pub mod messages;

pub use entities::*;
pub use errors::*;
pub use messages::*;
