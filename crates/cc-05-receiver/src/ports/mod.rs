//! # Ports Layer

pub mod outbound;

pub use outbound::{DestinationHandler, HandlerBook};
