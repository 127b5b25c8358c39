//! Common types used throughout jdbc-repoint
//!
//! This module contains the records exchanged between the matcher,
//! the planner, the registry collaborators and the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Datasource Types
// ============================================================================

/// A datasource as read from a registry session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceRecord {
    /// Datasource name (unique within a domain)
    pub name: String,
    /// JDBC driver class; absent for unconfigured resources
    #[serde(default)]
    pub driver_name: Option<String>,
    /// Connection URL currently configured
    #[serde(default)]
    pub current_url: String,
}

impl DatasourceRecord {
    /// Create a new datasource record
    pub fn new(
        name: impl Into<String>,
        driver_name: impl Into<String>,
        current_url: impl Into<String>,
    ) -> Self {
        let driver_name = driver_name.into();
        Self {
            name: name.into(),
            driver_name: (!driver_name.is_empty()).then_some(driver_name),
            current_url: current_url.into(),
        }
    }

    /// Create a record with no driver configured
    pub fn without_driver(name: impl Into<String>, current_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver_name: None,
            current_url: current_url.into(),
        }
    }

    /// Whether a non-empty driver name is configured
    pub fn has_driver(&self) -> bool {
        self.driver_name
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}

/// A datasource whose URL should be replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Datasource name
    pub datasource_name: String,
    /// URL before the change
    pub old_url: String,
    /// URL rendered from the connection map
    pub new_url: String,
}

// ============================================================================
// Targeting
// ============================================================================

/// Kind of deployment target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A cluster of managed servers
    #[default]
    Cluster,
    /// A single server
    Server,
}

impl TargetKind {
    /// Collection name used by the management tree
    pub fn collection(self) -> &'static str {
        match self {
            TargetKind::Cluster => "clusters",
            TargetKind::Server => "servers",
        }
    }
}

/// A typed deployment target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    /// Target name
    pub name: String,
    /// Target kind
    pub kind: TargetKind,
}

impl TargetDescriptor {
    /// Create a cluster target
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Cluster,
        }
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.collection(), self.name)
    }
}

/// Assign a datasource to a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetargetInstruction {
    /// Datasource name
    pub datasource_name: String,
    /// New target
    pub target: TargetDescriptor,
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Backoff strategy for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_driver_detection() {
        assert!(DatasourceRecord::new("DS1", "oracle.jdbc.OracleDriver", "u").has_driver());
        assert!(!DatasourceRecord::new("DS1", "", "u").has_driver());
        assert!(!DatasourceRecord::without_driver("DS1", "u").has_driver());

        let blank = DatasourceRecord {
            name: "DS1".to_string(),
            driver_name: Some("  ".to_string()),
            current_url: String::new(),
        };
        assert!(!blank.has_driver());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(
            TargetDescriptor::cluster("MyCluster").to_string(),
            "clusters/MyCluster"
        );
    }

    #[test]
    fn test_backoff_serde() {
        let b: BackoffType = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(b, BackoffType::Linear);
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
    }
}
