//! Datasource registry module
//!
//! The narrow interface the engine uses to read and mutate datasources on
//! an administration server.
//!
//! # Overview
//!
//! The registry module provides:
//! - `RegistryConnector` - Opens one session per domain
//! - `RegistrySession` - Edit session lifecycle plus datasource reads and mutations
//! - `InMemoryRegistry` - Registry held in memory, for tests and rehearsals
//! - `RestConnector` - WebLogic RESTful management API client

mod memory;
mod rest;

pub use memory::{DatasourceState, FailOn, InMemoryRegistry, InMemorySession, Operation};
pub use rest::{RestConnector, RestSession};

use crate::config::DomainConfig;
use crate::error::Result;
use crate::types::{DatasourceRecord, TargetDescriptor};
use async_trait::async_trait;

/// Opens registry sessions
#[async_trait]
pub trait RegistryConnector: Send + Sync {
    /// Connect to the administration server of a domain
    async fn connect(&self, domain: &DomainConfig) -> Result<Box<dyn RegistrySession>>;
}

/// A connected administration session for one domain
///
/// Mutations are only valid between `begin_edit` and `activate`.
#[async_trait]
pub trait RegistrySession: Send {
    /// Open an edit session
    async fn begin_edit(&mut self) -> Result<()>;

    /// Read every datasource of the domain
    async fn list_datasources(&mut self) -> Result<Vec<DatasourceRecord>>;

    /// Replace a datasource's connection URL
    async fn set_url(&mut self, name: &str, url: &str) -> Result<()>;

    /// Remove every target from a datasource
    async fn clear_targets(&mut self, name: &str) -> Result<()>;

    /// Replace a datasource's targets with a single target
    async fn set_target(&mut self, name: &str, target: &TargetDescriptor) -> Result<()>;

    /// Commit and activate the pending edits
    async fn activate(&mut self) -> Result<()>;

    /// Close the session, discarding edits that were not activated
    async fn disconnect(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests;
