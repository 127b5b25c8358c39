//! CLI module
//!
//! Command-line interface for re-pointing datasources.
//!
//! # Commands
//!
//! - `run` - Re-point and retarget datasources on every listed domain
//! - `validate` - Parse input files without connecting
//! - `show-map` - Print the rendered URL of every service
//! - `resolve` - Show how a single URL would be matched

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
