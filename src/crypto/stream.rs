//! Chunked stream filters.
//!
//! # Decryption
//! [`Decryptor`] reads `block_len`-byte ciphertext chunks (the last one may
//! be shorter), authenticates each under the current nonce and writes the
//! recovered plaintext.  The nonce advances after every successful chunk.
//! The first authentication failure aborts the stream; plaintext from
//! earlier chunks has already been written.
//!
//! # Encryption
//! [`Encryptor`] is the inverse: plaintext is cut into
//! `block_len - TAG_LEN` byte chunks so that every sealed chunk except the
//! last is exactly `block_len` bytes.
//!
//! Both filters consume `self`, so a nonce sequence cannot outlive the
//! stream it was created for.

use std::io::{Read, Write};

use serde::Serialize;

use crate::config::Options;
use crate::io_stream::read_full;

use super::{Cipher, CryptoError, Key, NonceCounter, Sealer, TAG_LEN};

/// Totals for one filtered stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub cipher:    Cipher,
    pub chunks:    u64,
    pub bytes_in:  u64,
    pub bytes_out: u64,
}

impl StreamSummary {
    fn new(cipher: Cipher) -> Self {
        Self { cipher, chunks: 0, bytes_in: 0, bytes_out: 0 }
    }
}

// ── Decryptor ────────────────────────────────────────────────────────────────

pub struct Decryptor {
    sealer:    Sealer,
    cipher:    Cipher,
    nonce:     NonceCounter,
    chunk_len: usize,
}

impl Decryptor {
    pub fn new(key: &Key, opts: &Options) -> Result<Self, CryptoError> {
        opts.validate_crypto()?;
        Ok(Self {
            sealer:    Sealer::new(opts.cipher, key),
            cipher:    opts.cipher,
            nonce:     NonceCounter::new(),
            chunk_len: opts.block_len,
        })
    }

    pub fn nonce(&self) -> &NonceCounter {
        &self.nonce
    }

    /// Decrypt the next chunk in sequence.  The nonce is only advanced on
    /// success.
    pub fn decrypt_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let chunk_index = self.nonce.advanced();
        let plain = self
            .sealer
            .open(&self.nonce, chunk)
            .ok_or(CryptoError::AuthenticationFailure { chunk_index })?;
        self.nonce.increment();
        log::debug!("chunk {chunk_index}: {} -> {} bytes", chunk.len(), plain.len());
        Ok(plain)
    }

    /// Decrypt `input` to `output` until `input` is exhausted.
    pub fn decrypt_stream<R, W>(mut self, mut input: R, mut output: W) -> Result<StreamSummary, CryptoError>
    where
        R: Read,
        W: Write,
    {
        let mut summary = StreamSummary::new(self.cipher);
        let mut chunk = vec![0u8; self.chunk_len];

        loop {
            let len = read_full(&mut input, &mut chunk).map_err(CryptoError::Input)?;
            if len == 0 {
                break;
            }
            let plain = self.decrypt_chunk(&chunk[..len])?;
            output.write_all(&plain).map_err(CryptoError::Output)?;

            summary.chunks    += 1;
            summary.bytes_in  += len as u64;
            summary.bytes_out += plain.len() as u64;
        }

        output.flush().map_err(CryptoError::Output)?;
        log::info!("decrypted {} chunks, {} bytes", summary.chunks, summary.bytes_out);
        Ok(summary)
    }
}

// ── Encryptor ────────────────────────────────────────────────────────────────

pub struct Encryptor {
    sealer:    Sealer,
    cipher:    Cipher,
    nonce:     NonceCounter,
    plain_len: usize,
}

impl Encryptor {
    pub fn new(key: &Key, opts: &Options) -> Result<Self, CryptoError> {
        opts.validate_crypto()?;
        Ok(Self {
            sealer:    Sealer::new(opts.cipher, key),
            cipher:    opts.cipher,
            nonce:     NonceCounter::new(),
            plain_len: opts.block_len - TAG_LEN,
        })
    }

    pub fn nonce(&self) -> &NonceCounter {
        &self.nonce
    }

    pub fn encrypt_chunk(&mut self, plain: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let chunk_index = self.nonce.advanced();
        let sealed = self
            .sealer
            .seal(&self.nonce, plain)
            .ok_or(CryptoError::EncryptionFailed { chunk_index })?;
        self.nonce.increment();
        Ok(sealed)
    }

    /// Encrypt `input` to `output`.  Empty input produces empty output.
    pub fn encrypt_stream<R, W>(mut self, mut input: R, mut output: W) -> Result<StreamSummary, CryptoError>
    where
        R: Read,
        W: Write,
    {
        let mut summary = StreamSummary::new(self.cipher);
        let mut plain = vec![0u8; self.plain_len];

        loop {
            let len = read_full(&mut input, &mut plain).map_err(CryptoError::Input)?;
            if len == 0 {
                break;
            }
            let sealed = self.encrypt_chunk(&plain[..len])?;
            output.write_all(&sealed).map_err(CryptoError::Output)?;

            summary.chunks    += 1;
            summary.bytes_in  += len as u64;
            summary.bytes_out += sealed.len() as u64;
            if len < self.plain_len {
                break;
            }
        }

        output.flush().map_err(CryptoError::Output)?;
        log::info!("encrypted {} chunks, {} bytes", summary.chunks, summary.bytes_in);
        Ok(summary)
    }
}
