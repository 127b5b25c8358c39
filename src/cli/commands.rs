//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Re-point JDBC datasources across application-server domains
#[derive(Parser, Debug)]
#[command(name = "jdbc-repoint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Re-point and retarget datasources on every listed domain
    Run {
        /// Domain list: `block cluster adminURL username password` per line
        #[arg(short, long)]
        domains: PathBuf,

        /// Host/service map file
        #[arg(short, long)]
        map: PathBuf,

        /// Only consider datasources whose URL starts with this prefix
        #[arg(long, conflicts_with = "all_urls")]
        url_prefix: Option<String>,

        /// Consider every datasource regardless of its URL prefix
        #[arg(long)]
        all_urls: bool,

        /// Connect and report, but change nothing
        #[arg(long)]
        dry_run: bool,

        /// Reject services declared without addresses
        #[arg(long)]
        strict: bool,
    },

    /// Parse the map (and optionally the domain list) without connecting
    Validate {
        /// Host/service map file
        #[arg(short, long)]
        map: PathBuf,

        /// Domain list file
        #[arg(short, long)]
        domains: Option<PathBuf>,

        /// Reject services declared without addresses
        #[arg(long)]
        strict: bool,
    },

    /// Print every service of the map with its rendered URL
    ShowMap {
        /// Host/service map file
        #[arg(short, long)]
        map: PathBuf,
    },

    /// Show the service id of a URL and, with a map, its replacement
    Resolve {
        /// Existing connection URL
        url: String,

        /// Host/service map file
        #[arg(short, long)]
        map: Option<PathBuf>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one event per line)
    Json,
    /// Human-readable output
    Pretty,
}
