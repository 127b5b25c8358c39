//! Connection map module
//!
//! Parse the host/service map file into rendered connection URLs.
//!
//! # Overview
//!
//! The mapping module provides:
//! - `ConnectionDescriptor` - One service and its listener addresses
//! - `ConnectionMap` - Case-insensitive service name → URL lookup
//! - Line-oriented parsing with all-or-nothing error semantics

mod parser;
mod types;

pub use parser::{load_connection_map, parse_connection_map, parse_lines};
pub use types::{AddressEntry, ConnectionDescriptor, ConnectionMap, ParseOptions};
