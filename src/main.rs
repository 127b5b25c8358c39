//! jdbc-repoint CLI
//!
//! Re-points JDBC datasources across the domains of a domain list

use clap::Parser;
use jdbc_repoint::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable with --format json
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        // 2: unusable input, nothing was contacted; 1: some domain failed
        std::process::exit(if e.is_fatal_input() { 2 } else { 1 });
    }
}
