use clap::Parser;
use chaincat::cli::{self, CryptoArgs};
use std::path::PathBuf;

/// Encrypt standard input into a chunked AEAD stream readable by
/// `chain-decrypt` with the same key, cipher and block length.
#[derive(Parser)]
#[command(name = "chain-encrypt", version)]
struct Cli {
    /// File whose first 32 bytes are the raw key
    keyfile: PathBuf,
    #[command(flatten)]
    crypto: CryptoArgs,
}

fn main() {
    let args = Cli::parse();
    cli::init_logging();
    cli::exit_on_error("chain-encrypt", cli::encrypt(&args.keyfile, &args.crypto));
}
