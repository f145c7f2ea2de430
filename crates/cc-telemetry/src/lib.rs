//! # Cross-Chain Telemetry
//!
//! Structured logging for the cross-chain subsystems.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cc_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() {
//!     init_tracing(&TelemetryConfig::from_env()).expect("telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CC_SERVICE_NAME` | `cross-chain` | Service name in logs |
//! | `CC_LOG_LEVEL` | `info` | Log level filter |
//! | `CC_JSON_LOGS` | `false` | JSON output |
//! | `CC_SUBSYSTEM_ID` | `00` | Subsystem identifier |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber is already installed.
    #[error("Global tracing subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Install the global tracing subscriber.
///
/// Fails with [`TelemetryError::AlreadyInitialized`] when called twice in one
/// process; test harnesses should use [`try_init_for_tests`].
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logs {
        registry
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(config.with_target))
            .try_init()
    };
    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        service = %config.full_service_name(),
        json = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}

/// Install a quiet subscriber, ignoring the error if one already exists.
pub fn try_init_for_tests() {
    let _ = init_tracing(&TelemetryConfig::for_testing());
}
