//! Datasource matching
//!
//! Decides, per datasource, whether its URL should be replaced by the URL
//! the connection map holds for its service. Matching never mutates
//! anything; applying the results is up to the caller.

use crate::analyzer::extract_service_id;
use crate::mapping::ConnectionMap;
use crate::types::{DatasourceRecord, MatchResult};
use serde::Serialize;
use tracing::{debug, info};

/// Why a datasource was left alone without looking it up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    /// No JDBC driver configured
    NoDriver,
    /// URL does not start with the configured prefix
    PrefixMismatch {
        /// Required prefix
        prefix: String,
    },
}

/// Why a datasource keeps its current URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    /// Service id has no entry in the map
    NotInMap,
    /// The mapped URL is already configured
    AlreadyCurrent,
}

/// Outcome for a single datasource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum MatchDecision {
    /// URL will be replaced
    Update {
        /// Datasource name
        datasource: String,
        /// Extracted service id
        service_id: String,
        /// Current URL
        old_url: String,
        /// Replacement URL
        new_url: String,
    },
    /// URL stays as is
    Keep {
        /// Datasource name
        datasource: String,
        /// Extracted service id
        service_id: String,
        /// Current URL
        url: String,
        /// Reason
        reason: KeepReason,
    },
    /// Datasource not considered
    Skip {
        /// Datasource name
        datasource: String,
        /// Current URL
        url: String,
        /// Reason
        #[serde(flatten)]
        reason: SkipReason,
    },
}

impl MatchDecision {
    /// Name of the datasource the decision is about
    pub fn datasource(&self) -> &str {
        match self {
            MatchDecision::Update { datasource, .. }
            | MatchDecision::Keep { datasource, .. }
            | MatchDecision::Skip { datasource, .. } => datasource,
        }
    }
}

/// Result of matching a set of datasources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Datasources that need a new URL, in input order
    pub results: Vec<MatchResult>,
    /// One decision per input record, in input order
    pub decisions: Vec<MatchDecision>,
}

impl MatchOutcome {
    /// Names of the datasources that matched
    pub fn matched_names(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|r| r.datasource_name.clone())
            .collect()
    }
}

/// Match datasources against the connection map
pub fn match_datasources<'a, I>(
    datasources: I,
    map: &ConnectionMap,
    url_prefix: Option<&str>,
) -> MatchOutcome
where
    I: IntoIterator<Item = &'a DatasourceRecord>,
{
    let mut outcome = MatchOutcome::default();

    for record in datasources {
        let decision = decide(record, map, url_prefix);
        log_decision(&decision);

        if let MatchDecision::Update {
            datasource,
            old_url,
            new_url,
            ..
        } = &decision
        {
            outcome.results.push(MatchResult {
                datasource_name: datasource.clone(),
                old_url: old_url.clone(),
                new_url: new_url.clone(),
            });
        }
        outcome.decisions.push(decision);
    }

    outcome
}

fn decide(record: &DatasourceRecord, map: &ConnectionMap, url_prefix: Option<&str>) -> MatchDecision {
    if !record.has_driver() {
        return MatchDecision::Skip {
            datasource: record.name.clone(),
            url: record.current_url.clone(),
            reason: SkipReason::NoDriver,
        };
    }

    if let Some(prefix) = url_prefix.filter(|p| !p.is_empty()) {
        if !record.current_url.starts_with(prefix) {
            return MatchDecision::Skip {
                datasource: record.name.clone(),
                url: record.current_url.clone(),
                reason: SkipReason::PrefixMismatch {
                    prefix: prefix.to_string(),
                },
            };
        }
    }

    let service_id = extract_service_id(&record.current_url);
    match map.lookup(service_id) {
        Some(new_url) if new_url != record.current_url => MatchDecision::Update {
            datasource: record.name.clone(),
            service_id: service_id.to_string(),
            old_url: record.current_url.clone(),
            new_url: new_url.to_string(),
        },
        Some(_) => MatchDecision::Keep {
            datasource: record.name.clone(),
            service_id: service_id.to_string(),
            url: record.current_url.clone(),
            reason: KeepReason::AlreadyCurrent,
        },
        None => MatchDecision::Keep {
            datasource: record.name.clone(),
            service_id: service_id.to_string(),
            url: record.current_url.clone(),
            reason: KeepReason::NotInMap,
        },
    }
}

fn log_decision(decision: &MatchDecision) {
    match decision {
        MatchDecision::Update {
            datasource,
            service_id,
            old_url,
            new_url,
        } => info!(%datasource, %service_id, %old_url, %new_url, "Matched"),
        MatchDecision::Keep {
            datasource,
            service_id,
            url,
            reason,
        } => info!(%datasource, %service_id, %url, ?reason, "Keep"),
        MatchDecision::Skip {
            datasource,
            url,
            reason,
        } => debug!(%datasource, %url, ?reason, "Skipping"),
    }
}
