use std::path::{Path, PathBuf};

use crate::digest::Digest;
use crate::io_stream::read_full;

use super::{check_root, open_block_file, BlockStore, Framing, StoreError};

/// One file per block, named by the full hex digest.
#[derive(Debug, Clone)]
pub struct FlatStore {
    root:      PathBuf,
    block_len: usize,
}

impl FlatStore {
    pub fn open<P: AsRef<Path>>(root: P, block_len: usize) -> Result<Self, StoreError> {
        Ok(Self { root: check_root(root.as_ref())?, block_len })
    }

    pub fn block_path(&self, hash: &Digest) -> PathBuf {
        self.root.join(hash.to_hex())
    }
}

impl BlockStore for FlatStore {
    fn framing(&self) -> Framing {
        Framing::Exact
    }

    fn block_len(&self) -> usize {
        self.block_len
    }

    fn fetch(&self, hash: &Digest, buf: &mut [u8]) -> Result<usize, StoreError> {
        let mut file = open_block_file(&self.block_path(hash), hash)?;
        let len = buf.len().min(self.block_len);
        let n = read_full(&mut file, &mut buf[..len])
            .map_err(|source| StoreError::Io { hash: *hash, source })?;
        if n == 0 {
            return Err(StoreError::EmptyBlock { hash: *hash });
        }
        log::debug!("flat store: read {n} bytes for block {hash}");
        Ok(n)
    }
}
