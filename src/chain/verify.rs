//! Chain reconstruction with streaming integrity verification.
//!
//! Blocks are fetched in chain order, fed into one running digest and
//! written out in the same pass.  The trailer digest is only checked once
//! the last block is read, so everything written before an error is
//! provisional: callers must discard output unless `reconstruct` returned
//! `Ok`.
//!
//! The store's [`Framing`] decides what is hashed and what is emitted:
//!
//! | Framing  | Hashed                  | Emitted                           | End check |
//! |----------|-------------------------|-----------------------------------|-----------|
//! | `Exact`  | bytes returned          | bytes returned                    | total == declared, else `LengthMismatch` |
//! | `Padded` | all `block_len` bytes   | `min(remaining, block_len)` bytes | remaining == 0, else `TruncatedChain` |
//!
//! The chain text is parsed in full, trailer included, before the first
//! fetch.  A malformed line or trailer therefore never costs a block read.

use std::io::{self, BufRead, Write};

use serde::Serialize;
use thiserror::Error;

use crate::digest::{Digest, Hasher};
use crate::store::{BlockStore, Framing, StoreError};

use super::{Chain, ParseError, Trailer};

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("unable to read block {digest}: {source}")]
    BlockRead {
        digest: Digest,
        #[source]
        source: StoreError,
    },
    #[error("chain continues with block {digest} after all {declared} declared bytes were read")]
    PrematureEnd { digest: Digest, declared: u64 },
    #[error("premature end of chain: {missing} declared bytes were never read")]
    TruncatedChain { missing: u64 },
    #[error("size mismatch: trailer declares {declared} bytes, chain holds {actual}")]
    LengthMismatch { declared: u64, actual: u64 },
    #[error("hash mismatch: trailer declares {expected}, computed {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },
    #[error("unable to write output: {0}")]
    Output(#[source] io::Error),
}

/// Description of a stream that reconstructed and verified cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    pub framing: Framing,
    pub blocks:  u64,
    pub bytes:   u64,
    #[serde(serialize_with = "serialize_digest")]
    pub digest:  Digest,
}

fn serialize_digest<S: serde::Serializer>(d: &Digest, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&d.to_hex())
}

/// Per-run state: the running digest and counters.  Owned by one call to
/// [`Reconstructor::reconstruct`] and dropped with it.
struct Progress {
    hasher:  Hasher,
    blocks:  u64,
    emitted: u64,
}

impl Progress {
    fn new() -> Self {
        Self { hasher: Hasher::new(), blocks: 0, emitted: 0 }
    }

    fn finish(self, framing: Framing, trailer: &Trailer) -> Result<ChainSummary, VerifyError> {
        let actual = self.hasher.finalize();
        if actual != trailer.digest {
            return Err(VerifyError::DigestMismatch { expected: trailer.digest, actual });
        }
        Ok(ChainSummary { framing, blocks: self.blocks, bytes: self.emitted, digest: actual })
    }
}

pub struct Reconstructor<'s, S: BlockStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: BlockStore + ?Sized> Reconstructor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Read chain text from `chain`, write the recovered stream to `output`
    /// and verify it against the trailer.
    pub fn reconstruct<R, W>(&self, chain: R, mut output: W) -> Result<ChainSummary, VerifyError>
    where
        R: BufRead,
        W: Write,
    {
        let chain = Chain::read(chain)?;
        log::debug!("parsed chain: {} blocks, trailer {}", chain.len(), chain.trailer);
        self.reconstruct_chain(&chain, &mut output)
    }

    /// Reconstruct a chain that is already parsed.
    pub fn reconstruct_chain<W: Write>(
        &self,
        chain:      &Chain,
        mut output: W,
    ) -> Result<ChainSummary, VerifyError> {
        let summary = match self.store.framing() {
            Framing::Exact  => self.stream_exact(chain, &mut output)?,
            Framing::Padded => self.stream_padded(chain, &mut output)?,
        };
        finish_output(summary, &mut output)
    }

    fn fetch(&self, digest: &Digest, buf: &mut [u8]) -> Result<usize, VerifyError> {
        self.store
            .fetch(digest, buf)
            .map_err(|source| VerifyError::BlockRead { digest: *digest, source })
    }

    /// Emit every byte the store returns, then check the total length
    /// before the digest.
    fn stream_exact<W: Write>(
        &self,
        chain:  &Chain,
        output: &mut W,
    ) -> Result<ChainSummary, VerifyError> {
        let mut progress = Progress::new();
        let mut buf = vec![0u8; self.store.block_len()];

        for digest in &chain.digests {
            let n = self.fetch(digest, &mut buf)?;
            progress.hasher.update(&buf[..n]);
            output.write_all(&buf[..n]).map_err(VerifyError::Output)?;
            progress.emitted += n as u64;
            progress.blocks += 1;
            log::debug!("block {} {digest}: {n} bytes", progress.blocks);
        }

        if progress.emitted != chain.trailer.length {
            return Err(VerifyError::LengthMismatch {
                declared: chain.trailer.length,
                actual:   progress.emitted,
            });
        }
        progress.finish(Framing::Exact, &chain.trailer)
    }

    fn stream_padded<W: Write>(
        &self,
        chain:  &Chain,
        output: &mut W,
    ) -> Result<ChainSummary, VerifyError> {
        let declared = chain.trailer.length;
        let block_len = self.store.block_len();
        let mut progress = Progress::new();
        let mut buf = vec![0u8; block_len];

        for digest in &chain.digests {
            let remaining = declared - progress.emitted;
            if remaining == 0 {
                return Err(VerifyError::PrematureEnd { digest: *digest, declared });
            }
            self.fetch(digest, &mut buf)?;
            progress.hasher.update(&buf);

            let emit = remaining.min(block_len as u64) as usize;
            output.write_all(&buf[..emit]).map_err(VerifyError::Output)?;
            progress.emitted += emit as u64;
            progress.blocks += 1;
            log::debug!("block {} {digest}: {emit} of {block_len} bytes", progress.blocks);
        }

        if progress.emitted < declared {
            return Err(VerifyError::TruncatedChain { missing: declared - progress.emitted });
        }
        progress.finish(Framing::Padded, &chain.trailer)
    }
}

fn finish_output<W: Write>(summary: ChainSummary, output: &mut W) -> Result<ChainSummary, VerifyError> {
    output.flush().map_err(VerifyError::Output)?;
    log::info!(
        "verified {} blocks, {} bytes, digest {}",
        summary.blocks, summary.bytes, summary.digest
    );
    Ok(summary)
}
