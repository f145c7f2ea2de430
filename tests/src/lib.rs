//! # Cross-Chain Test Suite
//!
//! Flows that need more than one subsystem, or more than one chain.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # In-process chains bridged to each other
//! └── integration/      # Cross-chain flows
//!     ├── delivery.rs   # Forwarding, confirmations, watermark, retries
//!     └── governance.rs # Proposal lifecycle across two chains
//!
//! tests/benches/
//! └── delivery_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cc-tests
//!
//! # By flow
//! cargo test -p cc-tests integration::delivery::
//! cargo test -p cc-tests integration::governance::
//!
//! # Benchmarks
//! cargo bench -p cc-tests
//! ```

pub mod harness;
pub mod integration;
