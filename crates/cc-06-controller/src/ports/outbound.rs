//! # Outbound Ports

/// Source of the network emergency count - outbound port.
///
/// A count above the controller's last solved count means the network is
/// in an emergency the guardian has not handled yet.
pub trait EmergencyOracle: Send + Sync {
    /// Latest emergency count for this controller's chain.
    fn latest_emergency_count(&self) -> u64;
}
