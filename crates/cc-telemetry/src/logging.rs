//! Structured logging macros.
//!
//! Every line carries a `subsystem` field so that log aggregation can split
//! the forwarder, receiver and governance streams apart.

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_event {
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an envelope-related event with standard fields.
///
/// `$envelope_id` must implement `Display` (use a hex string for raw hashes).
#[macro_export]
macro_rules! log_envelope_event {
    ($level:ident, $subsystem:expr, $msg:expr, $envelope_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            envelope_id = %$envelope_id,
            $($($field)*,)?
            $msg
        )
    };
}
