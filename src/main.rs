//! CLI entry point for muxbar.

mod app;
mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_logging(args.verbose);
    let code = app::entry::run(args).await;
    std::process::exit(code);
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug output for muxbar.
fn init_logging(verbose: bool) {
    let default = if verbose { "muxbar=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
