//! Host/service map parser
//!
//! Reads the line-oriented map file:
//!
//! ```text
//! # comment
//! ORCL
//!     db1.example.com:1521
//!     db2.example.com:1521
//! REPORTS
//!     db3.example.com:1522
//! ```
//!
//! A non-indented line opens a service, indented lines add addresses to it.

use crate::error::{Error, Result};
use crate::mapping::types::{AddressEntry, ConnectionDescriptor, ConnectionMap, ParseOptions};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Classification of a single map line
enum Line<'a> {
    Ignored,
    Address(&'a str),
    Header(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Ignored;
    }
    match line.chars().next() {
        Some('#') => Line::Ignored,
        Some(' ' | '\t') => Line::Address(line.trim()),
        _ => Line::Header(line.trim()),
    }
}

/// Load a connection map from a file
pub fn load_connection_map(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ConnectionMap> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read map file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    parse_lines(content.lines(), options)
}

/// Parse a connection map from a string
pub fn parse_connection_map(content: &str, options: &ParseOptions) -> Result<ConnectionMap> {
    parse_lines(content.lines(), options)
}

/// Parse a connection map from individual lines
///
/// Either the whole input parses or an error is returned; no partial map
/// escapes.
pub fn parse_lines<I, S>(lines: I, options: &ParseOptions) -> Result<ConnectionMap>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = ConnectionMap::default();
    let mut current: Option<(usize, ConnectionDescriptor)> = None;

    for (index, line) in lines.into_iter().enumerate() {
        let line_no = index + 1;
        match classify(line.as_ref()) {
            Line::Ignored => {}
            Line::Address(text) => {
                let Some((_, descriptor)) = current.as_mut() else {
                    return Err(Error::malformed_map(
                        line_no,
                        format!("address '{text}' appears before any service name"),
                    ));
                };
                descriptor.push(parse_address(line_no, text)?);
            }
            Line::Header(name) => {
                if let Some((header_line, descriptor)) = current.take() {
                    close_descriptor(&mut map, header_line, descriptor, options)?;
                }
                current = Some((line_no, ConnectionDescriptor::new(name)));
            }
        }
    }

    if let Some((header_line, descriptor)) = current.take() {
        close_descriptor(&mut map, header_line, descriptor, options)?;
    }

    Ok(map)
}

/// Parse `host:port`
fn parse_address(line_no: usize, text: &str) -> Result<AddressEntry> {
    let parts: Vec<&str> = text.split(':').collect();
    let [host, port] = parts.as_slice() else {
        return Err(Error::malformed_map(
            line_no,
            format!("expected 'host:port', got '{text}'"),
        ));
    };

    let (host, port) = (host.trim(), port.trim());
    if host.is_empty() || port.is_empty() {
        return Err(Error::malformed_map(
            line_no,
            format!("expected 'host:port', got '{text}'"),
        ));
    }

    let port = port
        .parse::<u16>()
        .map_err(|_| Error::malformed_map(line_no, format!("invalid port '{port}'")))?;

    Ok(AddressEntry::new(host, port))
}

fn close_descriptor(
    map: &mut ConnectionMap,
    header_line: usize,
    descriptor: ConnectionDescriptor,
    options: &ParseOptions,
) -> Result<()> {
    if descriptor.is_empty() {
        if options.reject_empty_services {
            return Err(Error::malformed_map(
                header_line,
                format!("service '{}' has no address lines", descriptor.service_name),
            ));
        }
        warn!(
            service = %descriptor.service_name,
            line = header_line,
            "Service has no addresses, skipping"
        );
        return Ok(());
    }

    let url = descriptor.render_url()?;
    if map.insert(&descriptor.service_name, url).is_some() {
        warn!(
            service = %descriptor.service_name,
            line = header_line,
            "Service defined more than once, keeping the later definition"
        );
    } else {
        debug!(
            service = %descriptor.service_name,
            addresses = descriptor.addresses.len(),
            "Parsed service"
        );
    }
    Ok(())
}
