use super::NONCE_LEN;

/// Per-stream chunk nonce.
///
/// Starts at all-zero and advances by one after each chunk, treating the
/// whole buffer as an unsigned little-endian integer.  Deliberately neither
/// `Clone` nor `Copy`: a counter belongs to exactly one stream.
#[derive(Debug, PartialEq, Eq)]
pub struct NonceCounter {
    bytes:    [u8; NONCE_LEN],
    advanced: u64,
}

impl NonceCounter {
    pub fn new() -> Self {
        Self { bytes: [0u8; NONCE_LEN], advanced: 0 }
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.bytes
    }

    /// Number of increments so far, which is also the index of the chunk
    /// the current value belongs to.
    pub fn advanced(&self) -> u64 {
        self.advanced
    }

    pub fn increment(&mut self) {
        for byte in self.bytes.iter_mut() {
            let (next, carry) = byte.overflowing_add(1);
            *byte = next;
            if !carry {
                break;
            }
        }
        self.advanced += 1;
    }
}

impl Default for NonceCounter {
    fn default() -> Self {
        Self::new()
    }
}
