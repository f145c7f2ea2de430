// =============================================================================
// NIBBLES: Half-byte path representation
// =============================================================================

/// Nibble path for trie traversal.
///
/// Hashed keys are converted to nibbles (half-bytes, 0-15) for traversal
/// through the trie. A 32-byte key becomes 64 nibbles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nibbles(pub Vec<u8>);

impl Nibbles {
    /// Create nibbles from arbitrary bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut nibbles = Vec::with_capacity(bytes.len() * 2);
        for byte in bytes {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }
        Nibbles(nibbles)
    }

    /// Number of nibbles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the path is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Nibbles from `start` onwards, empty when `start` is past the end.
    pub fn tail(&self, start: usize) -> &[u8] {
        self.0.get(start..).unwrap_or(&[])
    }

    /// Encode nibbles with hex-prefix.
    ///
    /// First nibble encodes flags: 0=extension even, 1=extension odd,
    /// 2=leaf even, 3=leaf odd. With an odd count the first path nibble
    /// shares the flag byte.
    pub fn encode_hex_prefix(&self, is_leaf: bool) -> Vec<u8> {
        let odd = self.len() % 2 == 1;
        let prefix = if is_leaf { 2 } else { 0 } + u8::from(odd);

        let mut result = Vec::with_capacity(self.len() / 2 + 1);
        let rest = if odd {
            result.push((prefix << 4) | self.0[0]);
            &self.0[1..]
        } else {
            result.push(prefix << 4);
            &self.0[..]
        };
        for chunk in rest.chunks(2) {
            result.push((chunk[0] << 4) | chunk.get(1).copied().unwrap_or(0));
        }
        result
    }

    /// Decode hex-prefix encoded bytes back to nibbles.
    ///
    /// Returns `None` for an empty input or an unknown flag nibble.
    pub fn decode_hex_prefix(encoded: &[u8]) -> Option<(Self, bool)> {
        let first = *encoded.first()?;
        let prefix = first >> 4;
        if prefix > 3 {
            return None;
        }
        let is_leaf = prefix >= 2;
        let odd = prefix % 2 == 1;

        let mut nibbles = Vec::with_capacity(encoded.len() * 2);
        if odd {
            nibbles.push(first & 0x0F);
        }
        for &byte in &encoded[1..] {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }

        Some((Nibbles(nibbles), is_leaf))
    }
}
