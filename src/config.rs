use thiserror::Error;

use crate::crypto::{Cipher, TAG_LEN};

/// Default block length: 4 KiB.
pub const DEFAULT_BLOCK_LEN: usize = 4096;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block length must be greater than zero")]
    ZeroBlockLen,
    #[error("block length {block_len} leaves no room for plaintext after the {TAG_LEN}-byte tag")]
    BlockLenBelowTag { block_len: usize },
}

/// Runtime settings shared by the reconstruction and crypto tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Length of one stored block, and of one ciphertext chunk.
    pub block_len: usize,
    pub cipher:    Cipher,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            block_len: DEFAULT_BLOCK_LEN,
            cipher:    Cipher::default(),
        }
    }
}

impl Options {
    pub fn with_block_len(block_len: usize) -> Self {
        Self { block_len, ..Self::default() }
    }

    /// Check the settings needed to read a block store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_len == 0 {
            return Err(ConfigError::ZeroBlockLen);
        }
        Ok(())
    }

    /// Check the settings needed to run a crypto filter.
    pub fn validate_crypto(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.block_len <= TAG_LEN {
            return Err(ConfigError::BlockLenBelowTag { block_len: self.block_len });
        }
        Ok(())
    }
}
