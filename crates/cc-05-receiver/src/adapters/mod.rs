//! # Adapters Layer

mod recording;

pub use recording::{ReceivedMessage, RecordingHandler};
