//! CLI runner - executes commands

use crate::analyzer::extract_service_id;
use crate::audit::{AuditEvent, AuditLog};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_domain_list, Settings};
use crate::engine::{BatchReport, EngineConfig, RepointEngine};
use crate::error::{Error, Result};
use crate::mapping::{load_connection_map, ConnectionMap};
use crate::registry::RestConnector;
use serde_json::json;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                domains,
                map,
                url_prefix,
                all_urls,
                dry_run,
                strict,
            } => {
                let mut settings = self.load_settings()?;
                if let Some(prefix) = url_prefix {
                    settings.url_prefix = Some(prefix.clone());
                }
                if *all_urls {
                    settings.url_prefix = None;
                }
                settings.dry_run |= *dry_run;
                settings.strict_map |= *strict;
                self.repoint(&settings, domains, map).await
            }
            Commands::Validate {
                map,
                domains,
                strict,
            } => {
                let mut settings = self.load_settings()?;
                settings.strict_map |= *strict;
                self.validate(&settings, map, domains.as_deref())
            }
            Commands::ShowMap { map } => {
                let settings = self.load_settings()?;
                let map = load_connection_map(map, &settings.parse_options())?;
                for line in render_map(&map, self.cli.format) {
                    println!("{line}");
                }
                Ok(())
            }
            Commands::Resolve { url, map } => {
                let settings = self.load_settings()?;
                let map = map
                    .as_ref()
                    .map(|path| load_connection_map(path, &settings.parse_options()))
                    .transpose()?;
                println!("{}", render_resolution(url, map.as_ref(), self.cli.format));
                Ok(())
            }
        }
    }

    /// Load settings, falling back to defaults
    fn load_settings(&self) -> Result<Settings> {
        match &self.cli.settings {
            Some(path) => Settings::from_file(path),
            None => Ok(Settings::default()),
        }
    }

    /// Re-point every domain
    async fn repoint(&self, settings: &Settings, domains: &Path, map: &Path) -> Result<()> {
        // Both inputs must be valid before any domain is contacted
        let map = load_connection_map(map, &settings.parse_options())?;
        let domains = load_domain_list(domains)?;
        info!(
            services = map.len(),
            domains = domains.len(),
            dry_run = settings.dry_run,
            "Inputs loaded"
        );

        if self.cli.format == OutputFormat::Pretty {
            println!("\n{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        }

        let connector = RestConnector::new(settings.http.clone());
        let engine = RepointEngine::new(&connector, &map).with_config(EngineConfig::from(settings));
        let mut audit = AuditLog::new();
        let report = engine.run(&domains, &mut audit).await;

        for line in render_run(&audit, &report, self.cli.format)? {
            println!("{line}");
        }

        if report.has_failures() || audit.has_failures() {
            return Err(Error::RunFailed {
                domains: report.domains.iter().filter(|d| d.has_failures()).count(),
                datasources: report.total_failed(),
            });
        }
        Ok(())
    }

    /// Parse inputs and report what was found
    fn validate(&self, settings: &Settings, map: &Path, domains: Option<&Path>) -> Result<()> {
        let map = load_connection_map(map, &settings.parse_options())?;
        let domain_count = domains.map(load_domain_list).transpose()?.map(|d| d.len());

        match self.cli.format {
            OutputFormat::Json => println!(
                "{}",
                json!({ "valid": true, "services": map.len(), "domains": domain_count })
            ),
            OutputFormat::Pretty => {
                println!("Map OK: {} service(s)", map.len());
                if let Some(count) = domain_count {
                    println!("Domain list OK: {count} domain(s)");
                }
            }
        }
        Ok(())
    }
}

/// Render the service listing
fn render_map(map: &ConnectionMap, format: OutputFormat) -> Vec<String> {
    map.iter()
        .map(|(service, url)| match format {
            OutputFormat::Json => json!({ "service": service, "url": url }).to_string(),
            OutputFormat::Pretty => format!("{service}\n\t{url}"),
        })
        .collect()
}

/// Render how a URL resolves against an optional map
fn render_resolution(url: &str, map: Option<&ConnectionMap>, format: OutputFormat) -> String {
    let service_id = extract_service_id(url);
    let mapped = map.and_then(|m| m.lookup(service_id));

    match format {
        OutputFormat::Json => json!({
            "url": url,
            "service_id": service_id,
            "new_url": mapped,
        })
        .to_string(),
        OutputFormat::Pretty => match (map, mapped) {
            (_, Some(new_url)) => format!("service: {service_id}\n->\n\t{new_url}"),
            (Some(_), None) => format!("service: {service_id} (not in map)"),
            (None, None) => format!("service: {service_id}"),
        },
    }
}

/// Render the audit trail followed by the summary
fn render_run(audit: &AuditLog, report: &BatchReport, format: OutputFormat) -> Result<Vec<String>> {
    match format {
        OutputFormat::Json => {
            let mut lines = audit
                .events()
                .iter()
                .map(serde_json::to_string)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            lines.push(serde_json::to_string(&json!({ "summary": report }))?);
            Ok(lines)
        }
        OutputFormat::Pretty => {
            let mut lines: Vec<String> = audit.events().iter().map(AuditEvent::to_pretty).collect();
            lines.push(String::new());
            lines.extend(report.summary_lines());
            Ok(lines)
        }
    }
}
