#![allow(dead_code)]

use chaincat::store::{BlockStore, Framing, StoreError};
use chaincat::{Chain, Digest, Trailer};
use std::cell::Cell;
use std::fs;
use std::path::Path;

/// Store `data` as one flat block and return its address.
pub fn put_flat(root: &Path, data: &[u8]) -> Digest {
    let digest = Digest::of(data);
    fs::write(root.join(digest.to_hex()), data).unwrap();
    digest
}

/// Store `data` zero-padded to `block_len` in the sharded layout.
pub fn put_sharded(root: &Path, data: &[u8], block_len: usize) -> Digest {
    let mut block = data.to_vec();
    block.resize(block_len, 0);
    let digest = Digest::of(&block);
    let shard = root.join(digest.shard());
    fs::create_dir_all(&shard).unwrap();
    fs::write(shard.join(digest.leaf()), &block).unwrap();
    digest
}

/// Split `data` into flat blocks and return the chain describing it.
pub fn flat_chain(root: &Path, data: &[u8], block_len: usize) -> Chain {
    Chain {
        digests: data.chunks(block_len).map(|c| put_flat(root, c)).collect(),
        trailer: Trailer { digest: Digest::of(data), length: data.len() as u64 },
    }
}

/// Split `data` into padded sharded blocks.  The trailer digest covers the
/// padded blocks, the trailer length only the real data.
pub fn sharded_chain(root: &Path, data: &[u8], block_len: usize) -> Chain {
    let digests: Vec<Digest> = data.chunks(block_len).map(|c| put_sharded(root, c, block_len)).collect();
    let mut padded = data.to_vec();
    padded.resize(digests.len() * block_len, 0);
    Chain {
        digests,
        trailer: Trailer { digest: Digest::of(&padded), length: data.len() as u64 },
    }
}

/// Deterministic, non-repeating test data.
pub fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Wraps a store and counts fetches.
pub struct Counting<S> {
    pub inner:   S,
    pub fetches: Cell<usize>,
}

impl<S> Counting<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, fetches: Cell::new(0) }
    }
}

impl<S: BlockStore> BlockStore for Counting<S> {
    fn framing(&self) -> Framing {
        self.inner.framing()
    }

    fn block_len(&self) -> usize {
        self.inner.block_len()
    }

    fn fetch(&self, hash: &Digest, buf: &mut [u8]) -> Result<usize, StoreError> {
        self.fetches.set(self.fetches.get() + 1);
        self.inner.fetch(hash, buf)
    }
}
