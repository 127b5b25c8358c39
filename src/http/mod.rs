//! HTTP client module
//!
//! Provides the HTTP client with retry and backoff strategies used to
//! talk to administration servers.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Basic Authentication**: Credentials from the domain list

mod client;

pub use client::{BasicAuth, HttpClient, HttpClientConfig, RequestConfig};
