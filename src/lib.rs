//! # jdbc-repoint
//!
//! Re-points JDBC datasources on application-server domains at new
//! database connection descriptors, then retargets them to a cluster.
//!
//! ## Overview
//!
//! - **Connection map**: a host/service map file, rendered into one
//!   load-balanced JDBC URL per service name
//! - **Matching**: the service id of every datasource URL is looked up in
//!   the map (case-insensitive)
//! - **Two phases per domain**: URL changes are activated first; only
//!   datasources whose change was committed are retargeted
//! - **Registries**: any management backend behind [`registry::RegistryConnector`],
//!   with a REST implementation and an in-memory one for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jdbc_repoint::{
//!     audit::AuditLog, config::parse_domain_list, engine::RepointEngine,
//!     mapping::{parse_connection_map, ParseOptions}, registry::InMemoryRegistry,
//! };
//!
//! let map = parse_connection_map("ORCL\n    db1:1521\n", &ParseOptions::default())?;
//! let domains = parse_domain_list("b1 Cluster1 t3://admin:7001 weblogic secret")?;
//! let registry = InMemoryRegistry::new();
//!
//! let mut audit = AuditLog::new();
//! let report = RepointEngine::new(&registry, &map).run(&domains, &mut audit).await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌─────────┐   ┌─────────┐
//! │  mapping  │──▶│ analyzer │──▶│ matcher │──▶│ planner │
//! └───────────┘   └──────────┘   └─────────┘   └─────────┘
//!                                      │
//!                         ┌────────────┴────────────┐
//!                         │   engine (per domain)   │
//!                         │ phase 1: setUrl, clear  │
//!                         │ phase 2: setTarget      │
//!                         └────────────┬────────────┘
//!                                      │
//!                   ┌──────────────────┴──────────────────┐
//!                   │ registry: RestConnector │ InMemory  │
//!                   └─────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

pub mod analyzer;
pub mod audit;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod mapping;
pub mod matcher;
pub mod planner;
pub mod registry;
pub mod template;
pub mod types;

// Re-export commonly used items
pub use analyzer::extract_service_id;
pub use audit::{AuditEvent, AuditLog, EventKind};
pub use config::{load_domain_list, parse_domain_list, DomainConfig, Settings};
pub use engine::{BatchReport, DomainOutcome, DomainReport, EngineConfig, RepointEngine};
pub use error::{Error, Result};
pub use mapping::{load_connection_map, parse_connection_map, ConnectionMap, ParseOptions};
pub use matcher::{match_datasources, MatchDecision, MatchOutcome};
pub use planner::plan;
pub use registry::{RegistryConnector, RegistrySession};
pub use types::{DatasourceRecord, MatchResult, RetargetInstruction, TargetDescriptor, TargetKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
