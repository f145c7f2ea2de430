//! Cross-chain integration flows.

pub mod delivery;
pub mod governance;
