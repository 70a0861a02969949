//! Plumbing shared by the command-line tools.
//!
//! Every tool reads standard input, writes data to standard output and
//! keeps standard error for logs, the optional `--summary` report and the
//! final diagnostic.  Any failure exits with status 1; clap handles usage
//! errors and `--version` itself.

use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;

use clap::Args;
use serde::Serialize;
use thiserror::Error;

use crate::chain::{ChainSummary, Reconstructor, VerifyError};
use crate::config::{ConfigError, Options, DEFAULT_BLOCK_LEN};
use crate::crypto::{Cipher, CryptoError, Decryptor, Encryptor, Key, StreamSummary};
use crate::store::{self, StoreError, StoreKind};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unable to open store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("unable to encode summary: {0}")]
    Report(#[from] serde_json::Error),
    #[error("unable to write summary: {0}")]
    ReportWrite(#[source] io::Error),
}

/// Flags accepted by every tool.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Length of one stored block or ciphertext chunk, in bytes
    #[arg(long, default_value_t = DEFAULT_BLOCK_LEN)]
    pub block_len: usize,
    /// Print a JSON summary to standard error after success
    #[arg(long)]
    pub summary: bool,
}

/// Flags accepted by the crypto filters.
#[derive(Args, Debug, Clone)]
pub struct CryptoArgs {
    /// AEAD cipher: chacha20-poly1305 or aes-256-gcm
    #[arg(long, default_value = "chacha20-poly1305", value_parser = parse_cipher)]
    pub cipher: Cipher,
    #[command(flatten)]
    pub common: CommonArgs,
}

impl CommonArgs {
    pub fn options(&self) -> Options {
        Options::with_block_len(self.block_len)
    }
}

impl CryptoArgs {
    pub fn options(&self) -> Options {
        Options { cipher: self.cipher, ..self.common.options() }
    }
}

fn parse_cipher(name: &str) -> Result<Cipher, String> {
    Cipher::from_name(name).ok_or_else(|| format!("unknown cipher '{name}'"))
}

/// Log to standard error; `RUST_LOG` overrides the default `warn` level.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
}

// ── Commands ─────────────────────────────────────────────────────────────────

/// Reconstruct the chain read from standard input out of the store at `root`.
pub fn cat(kind: StoreKind, root: &Path, args: &CommonArgs) -> Result<ChainSummary, CliError> {
    let opts = args.options();
    opts.validate()?;
    let store = store::open(kind, root, opts.block_len)?;
    log::debug!("opened {kind} store at {}", root.display());

    let stdin = io::stdin().lock();
    let stdout = BufWriter::with_capacity(opts.block_len, io::stdout().lock());
    let summary = Reconstructor::new(&store).reconstruct(stdin, stdout)?;
    report(args, &summary)?;
    Ok(summary)
}

pub fn decrypt(keyfile: &Path, args: &CryptoArgs) -> Result<StreamSummary, CliError> {
    let opts = args.options();
    let key = Key::from_file(keyfile)?;
    let summary = Decryptor::new(&key, &opts)?
        .decrypt_stream(io::stdin().lock(), io::stdout().lock())?;
    report(&args.common, &summary)?;
    Ok(summary)
}

pub fn encrypt(keyfile: &Path, args: &CryptoArgs) -> Result<StreamSummary, CliError> {
    let opts = args.options();
    let key = Key::from_file(keyfile)?;
    let summary = Encryptor::new(&key, &opts)?
        .encrypt_stream(io::stdin().lock(), io::stdout().lock())?;
    report(&args.common, &summary)?;
    Ok(summary)
}

fn report<T: Serialize>(args: &CommonArgs, summary: &T) -> Result<(), CliError> {
    if args.summary {
        write_report(io::stderr().lock(), summary)?;
    }
    Ok(())
}

/// One JSON object per line.
fn write_report<T: Serialize, W: Write>(mut out: W, summary: &T) -> Result<(), CliError> {
    let mut line = serde_json::to_vec(summary)?;
    line.push(b'\n');
    out.write_all(&line).map_err(CliError::ReportWrite)?;
    out.flush().map_err(CliError::ReportWrite)
}

/// Print `tool: error` and exit 1 on failure.
pub fn exit_on_error<T>(tool: &str, result: Result<T, CliError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("{tool}: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Probe {
        #[command(flatten)]
        crypto: CryptoArgs,
    }

    #[test]
    fn defaults() {
        let p = Probe::try_parse_from(["probe"]).unwrap();
        assert_eq!(p.crypto.options(), Options::default());
        assert!(!p.crypto.common.summary);
    }

    #[test]
    fn parses_cipher_and_block_len() {
        let p = Probe::try_parse_from(["probe", "--cipher", "aes-256-gcm", "--block-len", "512"])
            .unwrap();
        assert_eq!(p.crypto.options(), Options { block_len: 512, cipher: Cipher::Aes256Gcm });
        assert!(Probe::try_parse_from(["probe", "--cipher", "rot13"]).is_err());
    }

    #[test]
    fn report_is_one_json_line() {
        let summary = StreamSummary { cipher: Cipher::Aes256Gcm, chunks: 2, bytes_in: 40, bytes_out: 8 };
        let mut out = Vec::new();
        write_report(&mut out, &summary).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"cipher\":\"aes-256-gcm\",\"chunks\":2,\"bytes_in\":40,\"bytes_out\":8}\n"
        );
    }

    #[test]
    fn report_write_failure_is_an_error() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let summary = StreamSummary { cipher: Cipher::default(), chunks: 0, bytes_in: 0, bytes_out: 0 };
        assert!(matches!(write_report(Closed, &summary), Err(CliError::ReportWrite(_))));
    }
}
