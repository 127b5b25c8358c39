//! WebLogic RESTful management API registry
//!
//! Talks to `{admin}/management/weblogic/latest` on the edit tree. Every
//! request goes through [`HttpClient`], so transient failures are retried
//! with backoff inside the collaborator.

use crate::config::{DomainConfig, HttpSettings};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::registry::{RegistryConnector, RegistrySession};
use crate::types::{DatasourceRecord, TargetDescriptor};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

const JDBC_RESOURCES: &str = "JDBCSystemResources";

#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriverParams {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    driver_name: Option<String>,
}

/// Opens REST sessions against administration servers
#[derive(Debug, Clone, Default)]
pub struct RestConnector {
    settings: HttpSettings,
}

impl RestConnector {
    /// Create a connector using the given HTTP settings
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl RegistryConnector for RestConnector {
    async fn connect(&self, domain: &DomainConfig) -> Result<Box<dyn RegistrySession>> {
        let base = domain.management_url()?;
        let client = HttpClient::with_config(HttpClientConfig::from_settings(&self.settings))?
            .with_basic_auth(domain.username.clone(), domain.password.clone());

        let session = RestSession {
            client,
            base,
            edit_open: false,
        };

        let probe: NamedItem = session
            .client
            .get_json(
                &session.endpoint(&["edit"])?,
                RequestConfig::new()
                    .query("links", "none")
                    .query("fields", "name"),
            )
            .await?;
        info!(domain = %probe.name, admin_url = %domain.admin_url, "Connected");

        Ok(Box::new(session))
    }
}

/// Session against one administration server
#[derive(Debug)]
pub struct RestSession {
    client: HttpClient,
    base: Url,
    edit_open: bool,
}

impl RestSession {
    /// Absolute URL for a path below the management root
    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config(format!("'{}' cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    async fn change_manager(&self, action: &str) -> Result<()> {
        let url = self.endpoint(&["edit", "changeManager", action])?;
        self.client.post(&url, json!({})).await?;
        debug!(action, "Change manager call succeeded");
        Ok(())
    }

    async fn update_resource(&self, segments: &[&str], body: serde_json::Value) -> Result<()> {
        let url = self.endpoint(segments)?;
        self.client.post(&url, body).await?;
        Ok(())
    }

    fn require_edit(&self) -> Result<()> {
        if self.edit_open {
            Ok(())
        } else {
            Err(Error::NoEditSession)
        }
    }
}

#[async_trait]
impl RegistrySession for RestSession {
    async fn begin_edit(&mut self) -> Result<()> {
        self.change_manager("startEdit").await?;
        self.edit_open = true;
        Ok(())
    }

    async fn list_datasources(&mut self) -> Result<Vec<DatasourceRecord>> {
        let names: Items<NamedItem> = self
            .client
            .get_json(
                &self.endpoint(&["edit", JDBC_RESOURCES])?,
                RequestConfig::new()
                    .query("links", "none")
                    .query("fields", "name"),
            )
            .await?;

        let mut records = Vec::with_capacity(names.items.len());
        for item in names.items {
            let params: DriverParams = self
                .client
                .get_json(
                    &self.endpoint(&[
                        "edit",
                        JDBC_RESOURCES,
                        &item.name,
                        "JDBCResource",
                        "JDBCDriverParams",
                    ])?,
                    RequestConfig::new()
                        .query("links", "none")
                        .query("fields", "url,driverName"),
                )
                .await?;

            records.push(DatasourceRecord {
                name: item.name,
                driver_name: params.driver_name.filter(|d| !d.is_empty()),
                current_url: params.url.unwrap_or_default(),
            });
        }

        debug!(count = records.len(), "Listed datasources");
        Ok(records)
    }

    async fn set_url(&mut self, name: &str, url: &str) -> Result<()> {
        self.require_edit()?;
        self.update_resource(
            &["edit", JDBC_RESOURCES, name, "JDBCResource", "JDBCDriverParams"],
            json!({ "url": url }),
        )
        .await
    }

    async fn clear_targets(&mut self, name: &str) -> Result<()> {
        self.require_edit()?;
        self.update_resource(&["edit", JDBC_RESOURCES, name], json!({ "targets": [] }))
            .await
    }

    async fn set_target(&mut self, name: &str, target: &TargetDescriptor) -> Result<()> {
        self.require_edit()?;
        self.update_resource(
            &["edit", JDBC_RESOURCES, name],
            json!({
                "targets": [{ "identity": [target.kind.collection(), target.name] }]
            }),
        )
        .await
    }

    async fn activate(&mut self) -> Result<()> {
        self.require_edit()?;
        let result = self.change_manager("activate").await;
        self.edit_open = false;
        result
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.edit_open {
            warn!("Discarding edits that were not activated");
            self.edit_open = false;
            self.change_manager("cancelEdit").await?;
        }
        Ok(())
    }
}
