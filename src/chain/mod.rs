//! Chain text parsing.
//!
//! A chain is one lowercase hex digest per line, in stream order, closed by
//! a single trailer line:
//!
//! ```text
//! <64 hex>\n
//! <64 hex>\n
//! ><64 hex> <decimal length>\n
//! ```
//!
//! [`ChainReader`] parses lazily so the flat reconstructor can fetch each
//! block as soon as its line is validated.  [`Chain`] collects the whole
//! sequence for callers that need the trailer up front.
//!
//! Parsing stops at the first trailer line; nothing after it is read.

use std::fmt;
use std::io::{self, BufRead};
use std::str::FromStr;

use thiserror::Error;

use crate::digest::{Digest, HEX_LEN};

pub mod verify;

pub use verify::{ChainSummary, Reconstructor, VerifyError};

/// First byte of a trailer line.
pub const TRAILER_MARKER: u8 = b'>';

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid chain hash '{text}' on line {line}")]
    MalformedHash { line: usize, text: String },
    #[error("malformed trailer: {reason}")]
    MalformedTrailer { reason: &'static str },
    #[error("chain ended without a trailer line")]
    MissingTrailer,
    #[error("unable to read chain: {0}")]
    Io(#[from] io::Error),
}

// ── Trailer ──────────────────────────────────────────────────────────────────

/// Integrity assertion closing a chain: digest and byte length of the
/// reconstructed stream.  The length is always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    pub digest: Digest,
    pub length: u64,
}

impl Trailer {
    /// Parse a full trailer line, marker included, without its newline.
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        let malformed = |reason| ParseError::MalformedTrailer { reason };

        let rest = line
            .strip_prefix(&[TRAILER_MARKER])
            .ok_or(malformed("line does not start with '>'"))?;
        if rest.len() < HEX_LEN {
            return Err(malformed("trailer hash is too short"));
        }
        let (hash, rest) = rest.split_at(HEX_LEN);
        let digest = std::str::from_utf8(hash)
            .ok()
            .and_then(|h| Digest::from_hex(h).ok())
            .ok_or(malformed("trailer hash is not lowercase hex"))?;

        let length = rest
            .strip_prefix(b" ")
            .ok_or(malformed("no separator between trailer hash and length"))?;
        if length.is_empty() || !length.iter().all(u8::is_ascii_digit) {
            return Err(malformed("trailer length is not a decimal number"));
        }
        let length: u64 = std::str::from_utf8(length)
            .ok()
            .and_then(|l| l.parse().ok())
            .ok_or(malformed("trailer length is out of range"))?;
        if length == 0 {
            return Err(malformed("trailer length is zero"));
        }
        Ok(Self { digest, length })
    }
}

impl fmt::Display for Trailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">{} {}", self.digest, self.length)
    }
}

impl FromStr for Trailer {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

// ── Streaming reader ─────────────────────────────────────────────────────────

/// Lazy, single-pass iterator over the digests of a chain.
///
/// Yields `Ok(digest)` per hash line.  Once the trailer line is reached the
/// iterator ends and [`trailer`](Self::trailer) returns it.  Any error is
/// yielded once and ends iteration.
pub struct ChainReader<R> {
    input:   R,
    line:    Vec<u8>,
    line_no: usize,
    trailer: Option<Trailer>,
    done:    bool,
}

impl<R: BufRead> ChainReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line:    Vec::with_capacity(HEX_LEN + 1),
            line_no: 0,
            trailer: None,
            done:    false,
        }
    }

    /// The trailer, once iteration has reached it.
    pub fn trailer(&self) -> Option<&Trailer> {
        self.trailer.as_ref()
    }

    /// Number of lines consumed so far, trailer included.
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    /// Drain any remaining hash lines and return the trailer.
    pub fn finish(mut self) -> Result<Trailer, ParseError> {
        for digest in self.by_ref() {
            digest?;
        }
        self.trailer.ok_or(ParseError::MissingTrailer)
    }

    fn next_line(&mut self) -> Result<Option<Digest>, ParseError> {
        self.line.clear();
        if self.input.read_until(b'\n', &mut self.line)? == 0 {
            return Err(ParseError::MissingTrailer);
        }
        self.line_no += 1;
        if self.line.last() == Some(&b'\n') {
            self.line.pop();
        }

        if self.line.first() == Some(&TRAILER_MARKER) {
            self.trailer = Some(Trailer::parse(&self.line)?);
            return Ok(None);
        }

        std::str::from_utf8(&self.line)
            .ok()
            .and_then(|l| Digest::from_hex(l).ok())
            .map(Some)
            .ok_or_else(|| ParseError::MalformedHash {
                line: self.line_no,
                text: String::from_utf8_lossy(&self.line).into_owned(),
            })
    }
}

impl<R: BufRead> Iterator for ChainReader<R> {
    type Item = Result<Digest, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_line() {
            Ok(Some(digest)) => Some(Ok(digest)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// ── Fully parsed chain ───────────────────────────────────────────────────────

/// A complete chain held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub digests: Vec<Digest>,
    pub trailer: Trailer,
}

impl Chain {
    pub fn read<R: BufRead>(input: R) -> Result<Self, ParseError> {
        let mut reader = ChainReader::new(input);
        let digests = reader.by_ref().collect::<Result<Vec<_>, _>>()?;
        let trailer = reader.finish()?;
        Ok(Self { digests, trailer })
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

impl FromStr for Chain {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::read(s.as_bytes())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digest in &self.digests {
            writeln!(f, "{digest}")?;
        }
        writeln!(f, "{}", self.trailer)
    }
}
