//! Execution engine module
//!
//! Drives the per-domain processing.
//!
//! # Overview
//!
//! Domains are processed strictly one after another. Each domain runs two
//! phases on its own registry session:
//!
//! 1. URL phase: list, match, set URLs and clear targets, activate
//! 2. Retarget phase: assign the cluster to every datasource whose URL
//!    change was activated, activate
//!
//! The retarget phase never starts unless the URL phase activated.

mod types;

pub use types::{BatchReport, DomainOutcome, DomainReport, EngineConfig};

use crate::audit::AuditLog;
use crate::config::DomainConfig;
use crate::mapping::ConnectionMap;
use crate::matcher::{match_datasources, MatchDecision, MatchOutcome};
use crate::planner;
use crate::registry::{RegistryConnector, RegistrySession};
use tracing::{info, warn};

/// Re-points datasources across domains
pub struct RepointEngine<'a> {
    connector: &'a dyn RegistryConnector,
    map: &'a ConnectionMap,
    config: EngineConfig,
}

impl<'a> RepointEngine<'a> {
    /// Create a new engine
    pub fn new(connector: &'a dyn RegistryConnector, map: &'a ConnectionMap) -> Self {
        Self {
            connector,
            map,
            config: EngineConfig::default(),
        }
    }

    /// Set engine configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Process every domain in order
    pub async fn run(&self, domains: &[DomainConfig], audit: &mut AuditLog) -> BatchReport {
        let mut report = BatchReport::default();
        for domain in domains {
            report.domains.push(self.process_domain(domain, audit).await);
        }
        report
    }

    /// Process a single domain; failures are recorded, never propagated
    pub async fn process_domain(&self, domain: &DomainConfig, audit: &mut AuditLog) -> DomainReport {
        let mut report = DomainReport::new(domain);
        info!(block = %domain.block, admin_url = %domain.admin_url, "Connecting");

        let mut session = match self.connector.connect(domain).await {
            Ok(session) => session,
            Err(e) => {
                audit.failed(&domain.admin_url, None, "connect", &e);
                report.outcome = DomainOutcome::ConnectFailed;
                return report;
            }
        };

        report.outcome = self
            .run_phases(domain, session.as_mut(), audit, &mut report)
            .await;

        if let Err(e) = session.disconnect().await {
            warn!(admin_url = %domain.admin_url, error = %e, "Disconnect failed");
            audit.failed(&domain.admin_url, None, "disconnect", &e);
        }

        info!(
            admin_url = %domain.admin_url,
            outcome = ?report.outcome,
            updated = report.updated.len(),
            retargeted = report.retargeted.len(),
            failed = report.failed.len(),
            "Domain done"
        );
        report
    }

    async fn run_phases(
        &self,
        domain: &DomainConfig,
        session: &mut dyn RegistrySession,
        audit: &mut AuditLog,
        report: &mut DomainReport,
    ) -> DomainOutcome {
        let admin = domain.admin_url.as_str();

        let records = match session.list_datasources().await {
            Ok(records) => records,
            Err(e) => {
                audit.failed(admin, None, "list", &e);
                return DomainOutcome::UrlPhaseFailed;
            }
        };
        report.datasources_seen = records.len();

        let outcome = match_datasources(&records, self.map, self.config.url_prefix.as_deref());
        for decision in &outcome.decisions {
            if !matches!(decision, MatchDecision::Update { .. }) {
                audit.decision(admin, decision);
            }
        }

        if self.config.dry_run {
            for result in &outcome.results {
                audit.planned(admin, &result.datasource_name, &result.old_url, &result.new_url);
            }
            for instruction in planner::plan(outcome.matched_names(), &domain.cluster) {
                audit.planned_target(admin, &instruction.datasource_name, &instruction.target);
            }
            report.planned = outcome.matched_names();
            return DomainOutcome::DryRun;
        }

        if outcome.results.is_empty() {
            return DomainOutcome::Completed;
        }

        let Some(committed) = self.url_phase(admin, session, &outcome, audit, report).await
        else {
            return DomainOutcome::UrlPhaseFailed;
        };

        if committed.is_empty() {
            return DomainOutcome::Completed;
        }

        if self
            .retarget_phase(domain, session, &committed, audit, report)
            .await
        {
            DomainOutcome::Completed
        } else {
            DomainOutcome::RetargetPhaseFailed
        }
    }

    /// Returns the names whose URL change was activated, or `None` if the
    /// phase could not be committed
    async fn url_phase(
        &self,
        admin: &str,
        session: &mut dyn RegistrySession,
        outcome: &MatchOutcome,
        audit: &mut AuditLog,
        report: &mut DomainReport,
    ) -> Option<Vec<String>> {
        let results = &outcome.results;
        if let Err(e) = session.begin_edit().await {
            audit.failed(admin, None, "startEdit", &e);
            report.failed.extend(results.iter().map(|r| r.datasource_name.clone()));
            return None;
        }

        // `applied` goes on to retargeting; `stranded` kept the new URL but
        // not cleared targets, because restoring the old URL failed
        let mut applied = Vec::new();
        let mut stranded = Vec::new();
        for result in results {
            let name = result.datasource_name.as_str();
            if let Err(e) = session.set_url(name, &result.new_url).await {
                audit.failed(admin, Some(name), "setUrl", &e);
                report.failed.push(name.to_string());
                continue;
            }
            match session.clear_targets(name).await {
                Ok(()) => applied.push(result),
                Err(e) => {
                    audit.failed(admin, Some(name), "clearTargets", &e);
                    report.failed.push(name.to_string());
                    if let Err(e) = session.set_url(name, &result.old_url).await {
                        warn!(datasource = name, error = %e, "Could not restore previous URL");
                        audit.failed(admin, Some(name), "restoreUrl", &e);
                        stranded.push(result);
                    }
                }
            }
        }

        if applied.is_empty() && stranded.is_empty() {
            return Some(Vec::new());
        }

        if let Err(e) = session.activate().await {
            audit.failed(admin, None, "activate", &e);
            report
                .failed
                .extend(applied.iter().map(|r| r.datasource_name.clone()));
            return None;
        }

        // Every activated URL change is audited, stranded ones included
        let changed: Vec<&str> = applied
            .iter()
            .chain(&stranded)
            .map(|r| r.datasource_name.as_str())
            .collect();
        for decision in &outcome.decisions {
            if matches!(decision, MatchDecision::Update { .. })
                && changed.contains(&decision.datasource())
            {
                audit.decision(admin, decision);
                report.updated.push(decision.datasource().to_string());
            }
        }

        let committed: Vec<String> = applied
            .iter()
            .map(|r| r.datasource_name.clone())
            .collect();
        Some(committed)
    }

    /// Returns whether the retarget edits were activated
    async fn retarget_phase(
        &self,
        domain: &DomainConfig,
        session: &mut dyn RegistrySession,
        committed: &[String],
        audit: &mut AuditLog,
        report: &mut DomainReport,
    ) -> bool {
        let admin = domain.admin_url.as_str();

        if let Err(e) = session.begin_edit().await {
            audit.failed(admin, None, "startEdit", &e);
            report.failed.extend(committed.iter().cloned());
            return false;
        }

        let mut applied = Vec::new();
        for instruction in planner::plan(committed, &domain.cluster) {
            info!(datasource = %instruction.datasource_name, cluster = %instruction.target.name, "Retargeting");
            match session
                .set_target(&instruction.datasource_name, &instruction.target)
                .await
            {
                Ok(()) => applied.push(instruction),
                Err(e) => {
                    audit.failed(admin, Some(&instruction.datasource_name), "setTargets", &e);
                    report.failed.push(instruction.datasource_name);
                }
            }
        }

        if applied.is_empty() {
            return false;
        }

        if let Err(e) = session.activate().await {
            audit.failed(admin, None, "activate", &e);
            report
                .failed
                .extend(applied.into_iter().map(|i| i.datasource_name));
            return false;
        }

        for instruction in applied {
            audit.retargeted(admin, &instruction.datasource_name, &instruction.target);
            report.retargeted.push(instruction.datasource_name);
        }
        true
    }
}
