//! Service identifier extraction from JDBC URLs
//!
//! Works on both the descriptor form
//! (`...(CONNECT_DATA=(SERVICE_NAME=ORCL))`) and the simple form
//! (`jdbc:oracle:thin:@host:1521/ORCL`).

use regex::Regex;
use std::sync::LazyLock;

/// Regex for a `SERVICE_NAME=value` clause; the value ends at the next `)`
static SERVICE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SERVICE_NAME=([^)]+)").unwrap());

/// Extract the service identifier from a connection URL
///
/// Never fails. A single `SERVICE_NAME=` clause wins; otherwise the last
/// `/` segment; otherwise the whole input.
pub fn extract_service_id(url: &str) -> &str {
    let mut clauses = SERVICE_NAME_REGEX.captures_iter(url);
    if let (Some(only), None) = (clauses.next(), clauses.next()) {
        if let Some(value) = only.get(1) {
            return value.as_str();
        }
    }

    match url.rsplit_once('/') {
        Some((_, service)) => service,
        None => url,
    }
}
