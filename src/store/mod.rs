//! Content-addressed block stores.
//!
//! Two on-disk layouts are supported behind one [`BlockStore`] contract:
//!
//! | Layout | Path of a block | Block size on disk | [`Framing`] |
//! |--------|-----------------|--------------------|-------------|
//! | [`FlatStore`]    | `<root>/<64 hex>`              | 1..=`block_len`, last block may be short | `Exact`  |
//! | [`ShardedStore`] | `<root>/<2 hex>/<62 hex>`      | exactly `block_len`, zero padded         | `Padded` |
//!
//! Stores are read-only here.  They never check that a block's bytes hash
//! to its address; the reconstructor verifies the whole stream instead.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::digest::Digest;

pub mod flat;
pub mod sharded;

pub use flat::FlatStore;
pub use sharded::ShardedStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store root '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("block {hash} not found")]
    NotFound { hash: Digest },
    #[error("block {hash} is empty")]
    EmptyBlock { hash: Digest },
    #[error("block {hash} is short: expected {expected} bytes, read {actual}")]
    ShortBlock { hash: Digest, expected: usize, actual: usize },
    #[error("I/O error on block {hash}: {source}")]
    Io {
        hash:   Digest,
        #[source]
        source: io::Error,
    },
}

/// How the bytes a store returns relate to the logical stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Every byte returned is stream data; the last block may be short.
    Exact,
    /// Every block is `block_len` bytes; the tail of the last one is
    /// padding and only the trailer length says where data stops.
    Padded,
}

/// Resolve a digest to the bytes stored under it.
pub trait BlockStore {
    fn framing(&self) -> Framing;

    /// Size of the buffer passed to [`fetch`](Self::fetch).
    fn block_len(&self) -> usize;

    /// Read the block addressed by `hash` into `buf` (`block_len()` bytes)
    /// and return how many bytes are valid.
    ///
    /// A `Padded` store returns `block_len()` or fails; it never reports a
    /// short read as success.
    fn fetch(&self, hash: &Digest, buf: &mut [u8]) -> Result<usize, StoreError>;
}

impl<S: BlockStore + ?Sized> BlockStore for Box<S> {
    fn framing(&self) -> Framing { (**self).framing() }
    fn block_len(&self) -> usize { (**self).block_len() }
    fn fetch(&self, hash: &Digest, buf: &mut [u8]) -> Result<usize, StoreError> {
        (**self).fetch(hash, buf)
    }
}

// ── Backend selection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Flat,
    Sharded,
}

impl StoreKind {
    pub fn name(self) -> &'static str {
        match self {
            StoreKind::Flat    => "flat",
            StoreKind::Sharded => "sharded",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Open the backend for `kind` rooted at `root`.
pub fn open<P: AsRef<Path>>(
    kind:      StoreKind,
    root:      P,
    block_len: usize,
) -> Result<Box<dyn BlockStore>, StoreError> {
    Ok(match kind {
        StoreKind::Flat    => Box::new(FlatStore::open(root, block_len)?),
        StoreKind::Sharded => Box::new(ShardedStore::open(root, block_len)?),
    })
}

// ── Shared helpers ───────────────────────────────────────────────────────────

fn check_root(root: &Path) -> Result<PathBuf, StoreError> {
    if !root.is_dir() {
        return Err(StoreError::NotADirectory(root.to_owned()));
    }
    Ok(root.to_owned())
}

fn open_block_file(path: &Path, hash: &Digest) -> Result<std::fs::File, StoreError> {
    std::fs::File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound { hash: *hash },
        _                       => StoreError::Io { hash: *hash, source: e },
    })
}
