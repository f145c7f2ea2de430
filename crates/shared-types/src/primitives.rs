//! # Primitives
//!
//! Fixed-width identifiers mirroring the EVM word types.

pub use primitive_types::U256;

/// 20-byte account or contract address.
pub type Address = [u8; 20];

/// 32-byte hash (keccak256 everywhere in this workspace).
pub type Hash = [u8; 32];

/// EIP-155 chain identifier.
pub type ChainId = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// The zero address. Never a valid adapter, sender or portal.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// The zero hash. Returned by getters for unset roots.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Well-known chain ids used by configs and tests.
pub mod chains {
    use super::ChainId;

    /// Ethereum mainnet.
    pub const ETHEREUM: ChainId = 1;
    /// Optimism.
    pub const OPTIMISM: ChainId = 10;
    /// Polygon PoS.
    pub const POLYGON: ChainId = 137;
    /// Avalanche C-Chain.
    pub const AVALANCHE: ChainId = 43114;
}

/// Returns true for the zero address.
pub fn is_zero_address(address: &Address) -> bool {
    *address == ZERO_ADDRESS
}

/// Build an address whose last 8 bytes hold `value` (big-endian).
///
/// Handy for deterministic fixtures: `address_from_u64(1)` is
/// `0x0000000000000000000000000000000000000001`.
pub fn address_from_u64(value: u64) -> Address {
    let mut address = ZERO_ADDRESS;
    address[12..].copy_from_slice(&value.to_be_bytes());
    address
}

/// Lowercase `0x`-prefixed hex, used in log fields.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Convert a U256 into its 32-byte big-endian form.
pub fn u256_to_bytes(value: U256) -> Hash {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}
