//! Run configuration
//!
//! This module contains the optional YAML settings file and the
//! whitespace-delimited domain list.

use crate::error::{Error, Result};
use crate::mapping::ParseOptions;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Settings
// ============================================================================

/// Settings loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Only datasources whose URL starts with this prefix are considered
    #[serde(default = "default_url_prefix")]
    pub url_prefix: Option<String>,

    /// Reject map services without addresses
    #[serde(default)]
    pub strict_map: bool,

    /// List and report without mutating anything
    #[serde(default)]
    pub dry_run: bool,

    /// Management API client settings
    #[serde(default)]
    pub http: HttpSettings,
}

fn default_url_prefix() -> Option<String> {
    Some("jdbc:oracle".to_string())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url_prefix: default_url_prefix(),
            strict_map: false,
            dry_run: false,
            http: HttpSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read settings file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Map parser options derived from these settings
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            reject_empty_services: self.strict_map,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(Error::config("http.timeout_secs must be greater than 0"));
        }
        if self.http.initial_backoff_ms > self.http.max_backoff_ms {
            return Err(Error::config(
                "http.initial_backoff_ms cannot exceed http.max_backoff_ms",
            ));
        }
        if self.http.requested_by.trim().is_empty() {
            return Err(Error::config("http.requested_by cannot be empty"));
        }
        Ok(())
    }
}

/// Management API client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Backoff strategy
    #[serde(default)]
    pub backoff: BackoffType,

    /// Value of the `X-Requested-By` header the management API requires
    #[serde(default = "default_requested_by")]
    pub requested_by: String,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_requested_by() -> String {
    "jdbc-repoint".to_string()
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff: BackoffType::default(),
            requested_by: default_requested_by(),
        }
    }
}

impl HttpSettings {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Initial backoff delay
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Maximum backoff delay
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// ============================================================================
// Domain List
// ============================================================================

/// A credential that never appears in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the secret value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// One administered domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    /// Free-form block label (site, environment, ...)
    pub block: String,
    /// Cluster the matched datasources are retargeted to
    pub cluster: String,
    /// Administration server URL as written in the domain list
    pub admin_url: String,
    /// Administrator user
    pub username: String,
    /// Administrator password
    pub password: Secret,
}

impl DomainConfig {
    /// Base URL of the RESTful management API
    ///
    /// `t3`/`t3s` URLs are mapped to `http`/`https` on the same host and port.
    pub fn management_url(&self) -> Result<Url> {
        let parsed = Url::parse(&self.admin_url)?;
        let scheme = match parsed.scheme() {
            "t3" | "http" => "http",
            "t3s" | "https" => "https",
            other => {
                return Err(Error::config(format!(
                    "Unsupported admin URL scheme '{other}' in '{}'",
                    self.admin_url
                )))
            }
        };
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::config(format!("Admin URL '{}' has no host", self.admin_url)))?;

        let base = match parsed.port() {
            Some(port) => format!("{scheme}://{host}:{port}/management/weblogic/latest/"),
            None => format!("{scheme}://{host}/management/weblogic/latest/"),
        };
        Ok(Url::parse(&base)?)
    }
}

/// Load a domain list from a file
pub fn load_domain_list(path: impl AsRef<Path>) -> Result<Vec<DomainConfig>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read domain list '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    parse_domain_list(&content)
}

/// Parse a domain list: `block cluster adminURL username password` per line
pub fn parse_domain_list(content: &str) -> Result<Vec<DomainConfig>> {
    let mut domains = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [block, cluster, admin_url, username, password] = fields.as_slice() else {
            return Err(Error::domain_list(
                line_no,
                format!(
                    "expected 5 fields (block cluster adminURL username password), found {}",
                    fields.len()
                ),
            ));
        };

        let domain = DomainConfig {
            block: (*block).to_string(),
            cluster: (*cluster).to_string(),
            admin_url: (*admin_url).to_string(),
            username: (*username).to_string(),
            password: Secret::new(*password),
        };
        domain
            .management_url()
            .map_err(|e| Error::domain_list(line_no, e.to_string()))?;
        domains.push(domain);
    }

    Ok(domains)
}
