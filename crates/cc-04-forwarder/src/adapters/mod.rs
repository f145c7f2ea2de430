//! # Adapters Layer
//!
//! Test doubles for the bridge adapter port.

mod mock;

pub use mock::{ForwardedCall, MockBridgeAdapter};
