//! Main entry point for the gqlive CLI.

use clap::Parser;
use gqlive_cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with rendered results.
    let default_filter = if cli.verbose {
        "gqlive=debug"
    } else if cli.quiet {
        "gqlive=error"
    } else {
        "gqlive=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match gqlive_cli::run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
