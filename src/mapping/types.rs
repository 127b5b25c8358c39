//! Connection map types
//!
//! Address entries, connection descriptors, and the read-only map of
//! service name to rendered connection URL.

use crate::error::Result;
use crate::template::{self, TemplateContext};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Human-readable descriptor template; whitespace is stripped after rendering.
pub(crate) const JDBC_URL_TEMPLATE: &str = "
jdbc:oracle:thin:@(DESCRIPTION=
                    (ADDRESS_LIST=(LOAD_BALANCE=OFF)(FAILOVER=ON)
{{ address_list }}
                    )
                    (CONNECT_DATA=(SERVER=DEDICATED)(SERVICE_NAME={{ service_name }}))
                )
";

/// One address clause per entry.
pub(crate) const JDBC_ADDRESS_TEMPLATE: &str =
    "\t\t\t(ADDRESS=(PROTOCOL=TCP)(HOST={{ address.host }})(PORT={{ address.port }}))\n";

// ============================================================================
// Descriptors
// ============================================================================

/// A network address of a database listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    /// Host name or IP
    pub host: String,
    /// Listener port
    pub port: u16,
}

impl AddressEntry {
    /// Create a new address entry
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// A service name plus the addresses it is reachable on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Service name as written in the map file
    pub service_name: String,
    /// Addresses in encounter order
    pub addresses: Vec<AddressEntry>,
}

impl ConnectionDescriptor {
    /// Start a descriptor with no addresses
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            addresses: Vec::new(),
        }
    }

    /// Append an address
    pub fn push(&mut self, address: AddressEntry) {
        self.addresses.push(address);
    }

    /// Whether no address line has been read for this descriptor
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Render the connection URL for this descriptor
    ///
    /// The result contains no whitespace at all.
    pub fn render_url(&self) -> Result<String> {
        let mut address_list = String::new();
        for address in &self.addresses {
            let ctx = TemplateContext::new()
                .with("address", json!({"host": address.host, "port": address.port}));
            address_list.push_str(&template::render(JDBC_ADDRESS_TEMPLATE, &ctx)?);
        }

        let ctx = TemplateContext::new()
            .with("address_list", address_list)
            .with("service_name", self.service_name.as_str());
        let rendered = template::render(JDBC_URL_TEMPLATE, &ctx)?;

        Ok(rendered.chars().filter(|c| !c.is_whitespace()).collect())
    }
}

// ============================================================================
// Connection Map
// ============================================================================

/// Options controlling map parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Reject services declared without any address line instead of dropping them
    #[serde(default)]
    pub reject_empty_services: bool,
}

impl ParseOptions {
    /// Options that reject empty services
    pub fn strict() -> Self {
        Self {
            reject_empty_services: true,
        }
    }
}

/// Read-only mapping of service name to rendered connection URL
///
/// Keys are lower-cased on insert, so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionMap {
    entries: BTreeMap<String, String>,
}

impl ConnectionMap {
    /// Insert a rendered URL, replacing any entry with the same normalized key
    pub(crate) fn insert(&mut self, service_name: &str, url: String) -> Option<String> {
        self.entries.insert(normalize_key(service_name), url)
    }

    /// Look up the URL for a service name, ignoring case
    pub fn lookup(&self, service_name: &str) -> Option<&str> {
        self.entries
            .get(&normalize_key(service_name))
            .map(String::as_str)
    }

    /// Whether the map has an entry for the service
    pub fn contains(&self, service_name: &str) -> bool {
        self.lookup(service_name).is_some()
    }

    /// Number of services
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (normalized service name, URL) pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn normalize_key(service_name: &str) -> String {
    service_name.trim().to_lowercase()
}
