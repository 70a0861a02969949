//! BLAKE3 digests and their lowercase-hex wire form.
//!
//! Every block is addressed by the digest of its stored bytes and every
//! chain trailer carries the digest of the full stream.  On the wire a
//! digest is always exactly `2 * HASH_LEN` lowercase hex characters;
//! uppercase hex is rejected rather than normalised.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Byte length of a digest.
pub const HASH_LEN: usize = 32;
/// Character length of a hex-encoded digest.
pub const HEX_LEN: usize = HASH_LEN * 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    #[error("expected {HEX_LEN} hex characters, found {len}")]
    InvalidLength { len: usize },
    #[error("invalid hex character {ch:?} at offset {index}")]
    InvalidCharacter { index: usize, ch: char },
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; HASH_LEN]);

impl Digest {
    /// Digest of `bytes` in one shot.
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).into())
    }

    /// Parse a lowercase hex digest.  The input must be exactly
    /// [`HEX_LEN`] characters with no surrounding whitespace.
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        if let Some((index, ch)) = s.char_indices().find(|(_, c)| !is_lower_hex(*c)) {
            return Err(DigestError::InvalidCharacter { index, ch });
        }
        if s.len() != HEX_LEN {
            return Err(DigestError::InvalidLength { len: s.len() });
        }
        let mut out = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut out)
            .map_err(|_| DigestError::InvalidLength { len: s.len() })?;
        Ok(Self(out))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Two-character shard directory name.
    pub fn shard(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// Leaf file name inside the shard directory.
    pub fn leaf(&self) -> String {
        hex::encode(&self.0[1..])
    }
}

fn is_lower_hex(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='f')
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// ── Incremental hashing ──────────────────────────────────────────────────────

/// Running digest over a stream fed in arbitrary slices.
#[derive(Clone, Default)]
pub struct Hasher {
    inner: blake3::Hasher,
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn finalize(&self) -> Digest {
        Digest(self.inner.finalize().into())
    }
}
