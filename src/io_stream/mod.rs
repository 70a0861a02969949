//! Blocking byte-stream helpers shared by the stores and the crypto filters.
//!
//! `Read::read` may return fewer bytes than requested at any time.  Block
//! and chunk boundaries must line up exactly, so every fixed-size read in
//! this crate goes through [`read_full`], which only comes up short at EOF.

use std::io::{self, Read};

/// Fill `buf` from `reader` until it is full or the stream ends.
///
/// Returns the number of bytes read.  A value below `buf.len()` means EOF
/// was reached; `0` means the stream was already exhausted.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0)  => break,
            Ok(n)  => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
