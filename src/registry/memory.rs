//! In-memory datasource registry
//!
//! Keeps domains, datasources and targets in memory. Edits are staged per
//! session and only become visible on `activate`, like on a real
//! administration server. Failures can be injected per operation.

use crate::config::DomainConfig;
use crate::error::{Error, Result};
use crate::registry::{RegistryConnector, RegistrySession};
use crate::types::{DatasourceRecord, TargetDescriptor};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Operation to fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    /// Connecting to the domain
    Connect,
    /// Opening an edit session
    BeginEdit,
    /// Listing datasources
    List,
    /// Setting the URL of the named datasource
    SetUrl(String),
    /// Setting the named datasource to this exact URL
    SetUrlTo { name: String, url: String },
    /// Clearing the targets of the named datasource
    ClearTargets(String),
    /// Setting the target of the named datasource
    SetTarget(String),
    /// The n-th activation in the domain (1-based)
    Activate(usize),
}

/// Datasource as stored in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourceState {
    /// Name, driver and URL
    pub record: DatasourceRecord,
    /// Current targets
    pub targets: Vec<TargetDescriptor>,
}

/// Operation recorded in a domain's journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Connect,
    BeginEdit,
    List,
    SetUrl { name: String, url: String },
    ClearTargets { name: String },
    SetTarget { name: String, target: TargetDescriptor },
    Activate,
    Disconnect,
}

#[derive(Debug, Default)]
struct DomainState {
    datasources: Vec<DatasourceState>,
    failures: Vec<FailOn>,
    journal: Vec<Operation>,
    activations: usize,
}

impl DomainState {
    fn fails(&self, op: &FailOn) -> bool {
        self.failures.contains(op)
    }
}

/// Registry keyed by administration URL
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    domains: Arc<Mutex<HashMap<String, DomainState>>>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DomainState>> {
        lock(&self.domains)
    }

    /// Add a datasource to a domain, creating the domain if needed
    pub fn add_datasource(
        &self,
        admin_url: &str,
        record: DatasourceRecord,
        targets: Vec<TargetDescriptor>,
    ) {
        self.lock()
            .entry(admin_url.to_string())
            .or_default()
            .datasources
            .push(DatasourceState { record, targets });
    }

    /// Make an operation fail in a domain
    pub fn fail_on(&self, admin_url: &str, op: FailOn) {
        self.lock()
            .entry(admin_url.to_string())
            .or_default()
            .failures
            .push(op);
    }

    /// Committed state of a datasource
    pub fn datasource(&self, admin_url: &str, name: &str) -> Option<DatasourceState> {
        self.lock()
            .get(admin_url)?
            .datasources
            .iter()
            .find(|ds| ds.record.name == name)
            .cloned()
    }

    /// Operations performed against a domain, in order
    pub fn journal(&self, admin_url: &str) -> Vec<Operation> {
        self.lock()
            .get(admin_url)
            .map(|d| d.journal.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RegistryConnector for InMemoryRegistry {
    async fn connect(&self, domain: &DomainConfig) -> Result<Box<dyn RegistrySession>> {
        let mut domains = self.lock();
        let state = domains.get_mut(&domain.admin_url).ok_or_else(|| {
            Error::registry("connect", format!("no domain at {}", domain.admin_url))
        })?;
        if state.fails(&FailOn::Connect) {
            return Err(Error::registry("connect", "connection refused"));
        }
        state.journal.push(Operation::Connect);
        debug!(admin_url = %domain.admin_url, "Connected to in-memory domain");

        Ok(Box::new(InMemorySession {
            domains: Arc::clone(&self.domains),
            admin_url: domain.admin_url.clone(),
            staged: None,
        }))
    }
}

/// Session against an [`InMemoryRegistry`] domain
#[derive(Debug)]
pub struct InMemorySession {
    domains: Arc<Mutex<HashMap<String, DomainState>>>,
    admin_url: String,
    staged: Option<Vec<DatasourceState>>,
}

impl InMemorySession {
    /// Run `f` on the domain state after journaling `op` and checking `fail`
    fn with_domain<T>(
        &mut self,
        op: Operation,
        fail: &[FailOn],
        operation_name: &str,
        f: impl FnOnce(&mut DomainState, &mut Option<Vec<DatasourceState>>) -> Result<T>,
    ) -> Result<T> {
        let mut domains = lock(&self.domains);
        let state = domains
            .get_mut(&self.admin_url)
            .ok_or_else(|| Error::registry(operation_name, "domain disappeared"))?;
        state.journal.push(op);
        if fail.iter().any(|fail| state.fails(fail)) {
            return Err(Error::registry(operation_name, "injected failure"));
        }
        f(state, &mut self.staged)
    }

    fn mutate_staged(
        &mut self,
        op: Operation,
        fail: &[FailOn],
        operation_name: &str,
        name: &str,
        apply: impl FnOnce(&mut DatasourceState),
    ) -> Result<()> {
        let name = name.to_string();
        self.with_domain(op, fail, operation_name, move |_, staged| {
            let staged = staged.as_mut().ok_or(Error::NoEditSession)?;
            let ds = staged
                .iter_mut()
                .find(|ds| ds.record.name == name)
                .ok_or(Error::DatasourceNotFound { name })?;
            apply(ds);
            Ok(())
        })
    }
}

#[async_trait]
impl RegistrySession for InMemorySession {
    async fn begin_edit(&mut self) -> Result<()> {
        self.with_domain(
            Operation::BeginEdit,
            &[FailOn::BeginEdit],
            "startEdit",
            |state, staged| {
                if staged.is_none() {
                    *staged = Some(state.datasources.clone());
                }
                Ok(())
            },
        )
    }

    async fn list_datasources(&mut self) -> Result<Vec<DatasourceRecord>> {
        self.with_domain(Operation::List, &[FailOn::List], "list", |state, staged| {
            let view = staged.as_ref().unwrap_or(&state.datasources);
            Ok(view.iter().map(|ds| ds.record.clone()).collect())
        })
    }

    async fn set_url(&mut self, name: &str, url: &str) -> Result<()> {
        let op = Operation::SetUrl {
            name: name.to_string(),
            url: url.to_string(),
        };
        let fail = [
            FailOn::SetUrl(name.to_string()),
            FailOn::SetUrlTo {
                name: name.to_string(),
                url: url.to_string(),
            },
        ];
        let url = url.to_string();
        self.mutate_staged(op, &fail, "setUrl", name, |ds| {
            ds.record.current_url = url;
        })
    }

    async fn clear_targets(&mut self, name: &str) -> Result<()> {
        let op = Operation::ClearTargets {
            name: name.to_string(),
        };
        self.mutate_staged(
            op,
            &[FailOn::ClearTargets(name.to_string())],
            "clearTargets",
            name,
            |ds| ds.targets.clear(),
        )
    }

    async fn set_target(&mut self, name: &str, target: &TargetDescriptor) -> Result<()> {
        let op = Operation::SetTarget {
            name: name.to_string(),
            target: target.clone(),
        };
        let target = target.clone();
        self.mutate_staged(op, &[FailOn::SetTarget(name.to_string())], "setTargets", name, |ds| {
            ds.targets = vec![target];
        })
    }

    async fn activate(&mut self) -> Result<()> {
        self.with_domain(Operation::Activate, &[], "activate", |state, staged| {
            let pending = staged.take().ok_or(Error::NoEditSession)?;
            state.activations += 1;
            if state.fails(&FailOn::Activate(state.activations)) {
                return Err(Error::registry("activate", "injected failure"));
            }
            state.datasources = pending;
            Ok(())
        })
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.with_domain(Operation::Disconnect, &[], "disconnect", |_, staged| {
            *staged = None;
            Ok(())
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
