//! Keyed AEAD for chain streams.
//!
//! Key:        first `KEY_LEN` bytes of a key file, used as-is
//! Encryption: ChaCha20-Poly1305 (default) or AES-256-GCM, no associated data
//! Nonce:      96-bit little-endian counter, zero at stream start, +1 per chunk
//!
//! Chunk layout: [ ciphertext (≤ BLOCK_LEN − 16 B) | tag (16 B) ]
//!
//! The nonce is never stored or transmitted; both sides derive it from the
//! chunk position.  A key must therefore never encrypt two different
//! streams.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use aes_gcm::Aes256Gcm;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::ChaCha20Poly1305;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::io_stream::read_full;

pub mod nonce;
pub mod stream;

pub use nonce::NonceCounter;
pub use stream::{Decryptor, Encryptor, StreamSummary};

/// Raw key length.
pub const KEY_LEN:   usize = 32;
/// Nonce length; the counter spans all of it.
pub const NONCE_LEN: usize = 12;
/// Authentication tag appended to every chunk.
pub const TAG_LEN:   usize = 16;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("unable to read keyfile '{}': {source}", .path.display())]
    KeyRead {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("keyfile '{}' holds {len} bytes, need {KEY_LEN}", .path.display())]
    KeyTooShort { path: PathBuf, len: usize },
    #[error("unable to decrypt chunk {chunk_index}: authentication failed")]
    AuthenticationFailure { chunk_index: u64 },
    #[error("unable to encrypt chunk {chunk_index}")]
    EncryptionFailed { chunk_index: u64 },
    #[error("unable to read input: {0}")]
    Input(#[source] io::Error),
    #[error("unable to write output: {0}")]
    Output(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ── Key ──────────────────────────────────────────────────────────────────────

pub struct Key([u8; KEY_LEN]);

impl Key {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Load the first [`KEY_LEN`] bytes of `path`.  Anything after them is
    /// ignored; a shorter file is an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CryptoError> {
        let path = path.as_ref();
        let key_read = |source| CryptoError::KeyRead { path: path.to_owned(), source };

        let mut file = File::open(path).map_err(key_read)?;
        let mut key = [0u8; KEY_LEN];
        let len = read_full(&mut file, &mut key).map_err(key_read)?;
        if len < KEY_LEN {
            return Err(CryptoError::KeyTooShort { path: path.to_owned(), len });
        }
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

// ── Cipher ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Cipher {
    #[default]
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl Cipher {
    pub fn name(self) -> &'static str {
        match self {
            Cipher::ChaCha20Poly1305 => "chacha20-poly1305",
            Cipher::Aes256Gcm        => "aes-256-gcm",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "chacha20-poly1305" | "chacha20poly1305" => Some(Cipher::ChaCha20Poly1305),
            "aes-256-gcm" | "aes256gcm"              => Some(Cipher::Aes256Gcm),
            _ => None,
        }
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A keyed AEAD instance.
enum Sealer {
    ChaCha(ChaCha20Poly1305),
    Aes(Box<Aes256Gcm>),
}

impl Sealer {
    fn new(cipher: Cipher, key: &Key) -> Self {
        match cipher {
            Cipher::ChaCha20Poly1305 => Sealer::ChaCha(ChaCha20Poly1305::new(
                chacha20poly1305::Key::from_slice(key.as_bytes()),
            )),
            Cipher::Aes256Gcm => Sealer::Aes(Box::new(Aes256Gcm::new(
                aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_bytes()),
            ))),
        }
    }

    /// Authenticate and decrypt `chunk` (ciphertext followed by tag).
    fn open(&self, nonce: &NonceCounter, chunk: &[u8]) -> Option<Vec<u8>> {
        let n = nonce.as_bytes();
        match self {
            Sealer::ChaCha(c) => c.decrypt(chacha20poly1305::Nonce::from_slice(n), chunk).ok(),
            Sealer::Aes(c)    => c.decrypt(aes_gcm::Nonce::from_slice(n), chunk).ok(),
        }
    }

    /// Encrypt `plain`, returning ciphertext followed by tag.
    fn seal(&self, nonce: &NonceCounter, plain: &[u8]) -> Option<Vec<u8>> {
        let n = nonce.as_bytes();
        match self {
            Sealer::ChaCha(c) => c.encrypt(chacha20poly1305::Nonce::from_slice(n), plain).ok(),
            Sealer::Aes(c)    => c.encrypt(aes_gcm::Nonce::from_slice(n), plain).ok(),
        }
    }
}
