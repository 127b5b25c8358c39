//! Engine types
//!
//! Configuration and reports for the repoint engine.

use crate::config::{DomainConfig, Settings};
use serde::Serialize;

/// Configuration for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Only datasources whose URL starts with this prefix are considered
    pub url_prefix: Option<String>,
    /// List and report without mutating anything
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url_prefix: Some("jdbc:oracle".to_string()),
            dry_run: false,
        }
    }
}

impl From<&Settings> for EngineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            url_prefix: settings.url_prefix.clone(),
            dry_run: settings.dry_run,
        }
    }
}

/// How far a domain got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainOutcome {
    /// Not processed yet
    #[default]
    Pending,
    /// Both phases ran (individual datasources may still have failed)
    Completed,
    /// Nothing was mutated on purpose
    DryRun,
    /// Could not connect
    ConnectFailed,
    /// URL changes were not activated; nothing was retargeted
    UrlPhaseFailed,
    /// URL changes were activated but the retarget edits were not
    RetargetPhaseFailed,
}

impl DomainOutcome {
    /// Whether the domain needs operator attention
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            DomainOutcome::ConnectFailed
                | DomainOutcome::UrlPhaseFailed
                | DomainOutcome::RetargetPhaseFailed
        )
    }
}

/// Result of processing one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainReport {
    /// Block label from the domain list
    pub block: String,
    /// Admin URL
    pub admin_url: String,
    /// Target cluster
    pub cluster: String,
    /// Phase outcome
    pub outcome: DomainOutcome,
    /// Number of datasources listed
    pub datasources_seen: usize,
    /// Datasources whose new URL was activated
    pub updated: Vec<String>,
    /// Datasources retargeted to the cluster
    pub retargeted: Vec<String>,
    /// Datasources left for a dry run
    pub planned: Vec<String>,
    /// Datasources with a failed operation
    pub failed: Vec<String>,
}

impl DomainReport {
    /// Empty report for a domain
    pub fn new(domain: &DomainConfig) -> Self {
        Self {
            block: domain.block.clone(),
            admin_url: domain.admin_url.clone(),
            cluster: domain.cluster.clone(),
            outcome: DomainOutcome::Pending,
            datasources_seen: 0,
            updated: Vec::new(),
            retargeted: Vec::new(),
            planned: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Whether anything went wrong in this domain
    pub fn has_failures(&self) -> bool {
        self.outcome.is_failure() || !self.failed.is_empty()
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// One report per domain, in processing order
    pub domains: Vec<DomainReport>,
}

impl BatchReport {
    /// Whether any domain had a failure
    pub fn has_failures(&self) -> bool {
        self.domains.iter().any(DomainReport::has_failures)
    }

    /// Total datasources updated
    pub fn total_updated(&self) -> usize {
        self.domains.iter().map(|d| d.updated.len()).sum()
    }

    /// Total datasources retargeted
    pub fn total_retargeted(&self) -> usize {
        self.domains.iter().map(|d| d.retargeted.len()).sum()
    }

    /// Total datasources with failures
    pub fn total_failed(&self) -> usize {
        self.domains.iter().map(|d| d.failed.len()).sum()
    }

    /// One summary line per domain plus a total
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .domains
            .iter()
            .map(|d| {
                format!(
                    "{} {} -> {}: {:?}, {} listed, {} updated, {} retargeted, {} planned, {} failed",
                    d.block,
                    d.admin_url,
                    d.cluster,
                    d.outcome,
                    d.datasources_seen,
                    d.updated.len(),
                    d.retargeted.len(),
                    d.planned.len(),
                    d.failed.len()
                )
            })
            .collect();
        lines.push(format!(
            "Total: {} domains, {} updated, {} retargeted, {} failed",
            self.domains.len(),
            self.total_updated(),
            self.total_retargeted(),
            self.total_failed()
        ));
        lines
    }
}
