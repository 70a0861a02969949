use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::digest::Digest;
use crate::io_stream::read_full;

use super::{check_root, open_block_file, BlockStore, Framing, StoreError};

/// Two-level tree: `<root>/<first 2 hex>/<remaining 62 hex>`.
///
/// Every leaf holds exactly `block_len` bytes.  Anything shorter is an
/// error, never an end-of-data signal.
#[derive(Debug, Clone)]
pub struct ShardedStore {
    root:      PathBuf,
    block_len: usize,
}

impl ShardedStore {
    pub fn open<P: AsRef<Path>>(root: P, block_len: usize) -> Result<Self, StoreError> {
        Ok(Self { root: check_root(root.as_ref())?, block_len })
    }

    pub fn shard_path(&self, hash: &Digest) -> PathBuf {
        self.root.join(hash.shard())
    }

    pub fn block_path(&self, hash: &Digest) -> PathBuf {
        self.shard_path(hash).join(hash.leaf())
    }
}

impl BlockStore for ShardedStore {
    fn framing(&self) -> Framing {
        Framing::Padded
    }

    fn block_len(&self) -> usize {
        self.block_len
    }

    fn fetch(&self, hash: &Digest, buf: &mut [u8]) -> Result<usize, StoreError> {
        match fs::metadata(self.shard_path(hash)) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StoreError::NotFound { hash: *hash }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { hash: *hash })
            }
            Err(source) => return Err(StoreError::Io { hash: *hash, source }),
        }
        let mut file = open_block_file(&self.block_path(hash), hash)?;
        let len = buf.len().min(self.block_len);
        let n = read_full(&mut file, &mut buf[..len])
            .map_err(|source| StoreError::Io { hash: *hash, source })?;
        if n != self.block_len {
            return Err(StoreError::ShortBlock { hash: *hash, expected: self.block_len, actual: n });
        }
        log::debug!("sharded store: read block {hash}");
        Ok(n)
    }
}
