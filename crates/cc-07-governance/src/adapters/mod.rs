//! # Adapters Layer
//!
//! The controller as a message forwarder, plus mocks for tests and
//! simulations.

mod controller;
mod mock;

pub use mock::{ForwardedMessage, MockPowerStrategy, RecordingForwarder};
