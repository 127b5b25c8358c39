//! Audit trail
//!
//! Every decision the tool takes is recorded as an [`AuditEvent`] and
//! mirrored through `tracing`. The CLI prints the trail on stdout.

use crate::matcher::{KeepReason, MatchDecision, SkipReason};
use crate::types::TargetDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info};

/// Kind of audited decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// URL replaced
    Updated,
    /// URL left unchanged
    Kept,
    /// Datasource not considered
    Skipped,
    /// Datasource assigned to a new target
    Retargeted,
    /// Change that a dry run would have made
    Planned,
    /// Registry operation failed
    Failed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Updated => "CHANGE",
            EventKind::Kept => "KEEP",
            EventKind::Skipped => "SKIP",
            EventKind::Retargeted => "RETARGET",
            EventKind::Planned => "PLAN",
            EventKind::Failed => "FAIL",
        };
        f.write_str(label)
    }
}

/// A single audited decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When the decision was taken
    pub timestamp: DateTime<Utc>,
    /// Domain admin URL
    pub domain: String,
    /// Decision kind
    pub kind: EventKind,
    /// Datasource name; absent for domain-level events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
    /// URL before the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_url: Option<String>,
    /// URL after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_url: Option<String>,
    /// Assigned target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetDescriptor>,
    /// Free-form detail (reason, error message)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuditEvent {
    fn new(domain: &str, kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            domain: domain.to_string(),
            kind,
            datasource: None,
            old_url: None,
            new_url: None,
            target: None,
            message: None,
        }
    }

    #[must_use]
    fn datasource(mut self, name: impl Into<String>) -> Self {
        self.datasource = Some(name.into());
        self
    }

    #[must_use]
    fn urls(mut self, old_url: impl Into<String>, new_url: Option<String>) -> Self {
        self.old_url = Some(old_url.into());
        self.new_url = new_url;
        self
    }

    #[must_use]
    fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Human-readable rendering for the pretty output format
    pub fn to_pretty(&self) -> String {
        let name = self.datasource.as_deref().unwrap_or("-");
        let mut out = format!("{} [{}] [{}]", self.kind, self.domain, name);
        match (&self.old_url, &self.new_url) {
            (Some(old), Some(new)) => out.push_str(&format!("\n\t{old}\n->\n\t{new}")),
            (Some(old), None) => out.push_str(&format!(" [{old}]")),
            _ => {}
        }
        if let Some(target) = &self.target {
            out.push_str(&format!(" -> {target}"));
        }
        if let Some(message) = &self.message {
            out.push_str(&format!(" ({message})"));
        }
        out
    }
}

/// Collects the audit trail of a run
#[derive(Debug, Default)]
pub struct AuditLog {
    events: Vec<AuditEvent>,
}

impl AuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in order
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Number of events of a kind
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Whether any failure was recorded
    pub fn has_failures(&self) -> bool {
        self.count(EventKind::Failed) > 0
    }

    fn push(&mut self, event: AuditEvent) {
        let datasource = event.datasource.as_deref().unwrap_or("-");
        match event.kind {
            EventKind::Failed => error!(
                domain = %event.domain,
                datasource,
                message = event.message.as_deref().unwrap_or(""),
                "Failed"
            ),
            EventKind::Skipped => debug!(domain = %event.domain, datasource, "Skipped"),
            EventKind::Planned => info!(
                domain = %event.domain,
                datasource,
                new_url = event.new_url.as_deref().unwrap_or(""),
                "Planned (dry run)"
            ),
            _ => info!(domain = %event.domain, datasource, kind = %event.kind, "Recorded"),
        }
        self.events.push(event);
    }

    /// Record a matcher decision
    pub fn decision(&mut self, domain: &str, decision: &MatchDecision) {
        let event = match decision {
            MatchDecision::Update {
                datasource,
                old_url,
                new_url,
                ..
            } => AuditEvent::new(domain, EventKind::Updated)
                .datasource(datasource)
                .urls(old_url, Some(new_url.clone())),
            MatchDecision::Keep {
                datasource,
                url,
                reason,
                service_id,
            } => {
                let message = match reason {
                    KeepReason::NotInMap => format!("service '{service_id}' not in map"),
                    KeepReason::AlreadyCurrent => "already up to date".to_string(),
                };
                AuditEvent::new(domain, EventKind::Kept)
                    .datasource(datasource)
                    .urls(url, None)
                    .message(message)
            }
            MatchDecision::Skip {
                datasource,
                url,
                reason,
            } => {
                let message = match reason {
                    SkipReason::NoDriver => "no driver configured".to_string(),
                    SkipReason::PrefixMismatch { prefix } => {
                        format!("URL does not start with '{prefix}'")
                    }
                };
                AuditEvent::new(domain, EventKind::Skipped)
                    .datasource(datasource)
                    .urls(url, None)
                    .message(message)
            }
        };
        self.push(event);
    }

    /// Record a change that was planned but not applied
    pub fn planned(&mut self, domain: &str, datasource: &str, old_url: &str, new_url: &str) {
        let event = AuditEvent::new(domain, EventKind::Planned)
            .datasource(datasource)
            .urls(old_url, Some(new_url.to_string()));
        self.push(event);
    }

    /// Record a planned retarget in a dry run
    pub fn planned_target(&mut self, domain: &str, datasource: &str, target: &TargetDescriptor) {
        let mut event = AuditEvent::new(domain, EventKind::Planned).datasource(datasource);
        event.target = Some(target.clone());
        self.push(event);
    }

    /// Record a retarget
    pub fn retargeted(&mut self, domain: &str, datasource: &str, target: &TargetDescriptor) {
        let mut event = AuditEvent::new(domain, EventKind::Retargeted).datasource(datasource);
        event.target = Some(target.clone());
        self.push(event);
    }

    /// Record a failure; `datasource` is `None` for domain-level failures
    pub fn failed(
        &mut self,
        domain: &str,
        datasource: Option<&str>,
        operation: &str,
        error: &crate::error::Error,
    ) {
        let mut event =
            AuditEvent::new(domain, EventKind::Failed).message(format!("{operation}: {error}"));
        event.datasource = datasource.map(str::to_string);
        self.push(event);
    }
}
