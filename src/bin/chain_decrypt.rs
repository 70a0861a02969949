use clap::Parser;
use chaincat::cli::{self, CryptoArgs};
use std::path::PathBuf;

/// Decrypt a chunked AEAD stream from standard input to standard output.
#[derive(Parser)]
#[command(name = "chain-decrypt", version)]
struct Cli {
    /// File whose first 32 bytes are the raw key
    keyfile: PathBuf,
    #[command(flatten)]
    crypto: CryptoArgs,
}

fn main() {
    let args = Cli::parse();
    cli::init_logging();
    cli::exit_on_error("chain-decrypt", cli::decrypt(&args.keyfile, &args.crypto));
}
