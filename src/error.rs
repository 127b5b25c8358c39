//! Error types for jdbc-repoint
//!
//! One error enum for the whole crate. Input errors stop a run before any
//! domain is contacted; registry and HTTP errors are recorded per datasource
//! or per domain by the engine and never abort the batch.

use thiserror::Error;

/// The main error type for jdbc-repoint
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Input Errors
    // ============================================================================
    #[error("Malformed map line {line}: {message}")]
    MalformedMap { line: usize, message: String },

    #[error("Invalid domain list line {line}: {message}")]
    DomainList { line: usize, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid settings YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Undefined placeholder in URL template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // Registry Errors
    // ============================================================================
    #[error("Registry {operation} failed: {message}")]
    Registry { operation: String, message: String },

    #[error("Datasource '{name}' not found")]
    DatasourceNotFound { name: String },

    #[error("No edit session is open")]
    NoEditSession,

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Run Outcome
    // ============================================================================
    #[error("{domains} domain(s) need attention, {datasources} datasource(s) failed")]
    RunFailed { domains: usize, datasources: usize },
}

impl Error {
    /// Create a malformed map error
    pub fn malformed_map(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedMap {
            line,
            message: message.into(),
        }
    }

    /// Create a domain list error
    pub fn domain_list(line: usize, message: impl Into<String>) -> Self {
        Self::DomainList {
            line,
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a registry error
    pub fn registry(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registry {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    pub(crate) fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Whether this error comes from the input files rather than a domain
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            Error::MalformedMap { .. }
                | Error::DomainList { .. }
                | Error::Config { .. }
                | Error::YamlParse(_)
                | Error::FileNotFound { .. }
                | Error::UndefinedVariable { .. }
        )
    }

    /// Throttling, gateway errors, timeouts and refused connections
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Result type alias for jdbc-repoint
pub type Result<T> = std::result::Result<T, Error>;
