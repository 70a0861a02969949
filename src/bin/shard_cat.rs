use clap::Parser;
use chaincat::cli::{self, CommonArgs};
use chaincat::StoreKind;
use std::path::PathBuf;

/// Reconstruct a chain read from standard input out of a sharded block
/// store of fixed-size blocks, writing the verified stream to standard output.
#[derive(Parser)]
#[command(name = "shard-cat", version)]
struct Cli {
    /// Block store directory (`<2 hex>/<62 hex>` layout)
    store: PathBuf,
    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let args = Cli::parse();
    cli::init_logging();
    cli::exit_on_error("shard-cat", cli::cat(StoreKind::Sharded, &args.store, &args.common));
}
