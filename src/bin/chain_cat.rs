use clap::Parser;
use chaincat::cli::{self, CommonArgs};
use chaincat::StoreKind;
use std::path::PathBuf;

/// Reconstruct a chain read from standard input out of a flat block store,
/// writing the verified stream to standard output.
#[derive(Parser)]
#[command(name = "chain-cat", version)]
struct Cli {
    /// Block store directory (one file per block, named by its hex digest)
    store: PathBuf,
    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Cli::parse();
    cli::init_logging();
    cli::exit_on_error("chain-cat", cli::cat(StoreKind::Flat, &args.store, &args.common));
}
