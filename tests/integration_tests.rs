//! Integration tests using a mock management server
//!
//! Tests the full flow: map file → matching → REST edit sessions → report

use jdbc_repoint::audit::{AuditLog, EventKind};
use jdbc_repoint::config::{parse_domain_list, HttpSettings, Settings};
use jdbc_repoint::engine::{DomainOutcome, EngineConfig, RepointEngine};
use jdbc_repoint::mapping::{load_connection_map, ParseOptions};
use jdbc_repoint::registry::RestConnector;
use jdbc_repoint::types::BackoffType;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT: &str = "/management/weblogic/latest";
const RESOURCES: &str = "/management/weblogic/latest/edit/JDBCSystemResources";

const MAP: &str = "\
# production services
ORCL
    db1.example.com:1521
    db2.example.com:1521
REPORTS
\tdb3.example.com:1522
";

fn settings() -> HttpSettings {
    HttpSettings {
        timeout_secs: 5,
        max_retries: 0,
        initial_backoff_ms: 1,
        max_backoff_ms: 1,
        backoff: BackoffType::Constant,
        requested_by: "integration".to_string(),
    }
}

fn map_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MAP.as_bytes()).unwrap();
    file
}

async fn mount_domain(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/edit")))
        .and(basic_auth("weblogic", "welcome1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "prod"})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(RESOURCES))
        .and(query_param("links", "none"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "OrdersDS"}, {"name": "MailSession"}, {"name": "Archive"}]
        })))
        .mount(server)
        .await;

    let params = [
        (
            "OrdersDS",
            json!({"url": "jdbc:oracle:thin:@old-db:1521/orcl", "driverName": "oracle.jdbc.OracleDriver"}),
        ),
        (
            "MailSession",
            json!({"url": "jdbc:oracle:thin:@old-db:1521/ORCL", "driverName": null}),
        ),
        (
            "Archive",
            json!({"url": "jdbc:oracle:thin:@old-db:1521/ARCHIVE", "driverName": "oracle.jdbc.OracleDriver"}),
        ),
    ];
    for (name, body) in params {
        Mock::given(method("GET"))
            .and(path(format!("{RESOURCES}/{name}/JDBCResource/JDBCDriverParams")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}

async fn mount_change_manager(server: &MockServer, action: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("{ROOT}/edit/changeManager/{action}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_repoint_domain_over_rest() {
    let server = MockServer::start().await;
    mount_domain(&server).await;
    mount_change_manager(&server, "startEdit", 2).await;
    mount_change_manager(&server, "activate", 2).await;
    mount_change_manager(&server, "cancelEdit", 0).await;

    let map_file = map_file();
    let map = load_connection_map(map_file.path(), &ParseOptions::default()).unwrap();
    let new_url = map.lookup("orcl").unwrap().to_string();

    Mock::given(method("POST"))
        .and(path(format!("{RESOURCES}/OrdersDS/JDBCResource/JDBCDriverParams")))
        .and(body_json(json!({ "url": new_url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{RESOURCES}/OrdersDS")))
        .and(body_json(json!({"targets": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{RESOURCES}/OrdersDS")))
        .and(body_json(json!({
            "targets": [{"identity": ["clusters", "ProdCluster"]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let domains =
        parse_domain_list(&format!("north ProdCluster {} weblogic welcome1\n", server.uri()))
            .unwrap();
    let connector = RestConnector::new(settings());
    let engine = RepointEngine::new(&connector, &map);
    let mut audit = AuditLog::new();

    let report = engine.run(&domains, &mut audit).await;

    let domain = &report.domains[0];
    assert_eq!(domain.outcome, DomainOutcome::Completed);
    assert_eq!(domain.datasources_seen, 3);
    assert_eq!(domain.updated, vec!["OrdersDS".to_string()]);
    assert_eq!(domain.retargeted, vec!["OrdersDS".to_string()]);
    assert!(!report.has_failures());

    assert_eq!(audit.count(EventKind::Updated), 1);
    assert_eq!(audit.count(EventKind::Skipped), 1);
    assert_eq!(audit.count(EventKind::Kept), 1);
    assert_eq!(audit.count(EventKind::Retargeted), 1);
}

#[tokio::test]
async fn test_rejected_activation_skips_retarget() {
    let server = MockServer::start().await;
    mount_domain(&server).await;
    mount_change_manager(&server, "startEdit", 1).await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}/edit/changeManager/activate")))
        .respond_with(ResponseTemplate::new(400).set_body_string("validation failed"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{RESOURCES}/OrdersDS/JDBCResource/JDBCDriverParams")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{RESOURCES}/OrdersDS")))
        .and(body_json(json!({"targets": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let map_file = map_file();
    let map = load_connection_map(map_file.path(), &ParseOptions::default()).unwrap();
    let domains =
        parse_domain_list(&format!("north ProdCluster {} weblogic welcome1", server.uri()))
            .unwrap();
    let connector = RestConnector::new(settings());
    let engine = RepointEngine::new(&connector, &map);
    let mut audit = AuditLog::new();

    let report = engine.run(&domains, &mut audit).await;

    assert_eq!(report.domains[0].outcome, DomainOutcome::UrlPhaseFailed);
    assert_eq!(report.domains[0].failed, vec!["OrdersDS".to_string()]);
    assert!(report.has_failures());
    assert!(audit.has_failures());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests
            .iter()
            .filter(|r| r.url.path().ends_with("/changeManager/startEdit"))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_dry_run_sends_no_mutations() {
    let server = MockServer::start().await;
    mount_domain(&server).await;

    let settings = Settings::from_yaml("dry_run: true\nurl_prefix: jdbc:oracle:thin\n").unwrap();
    let map_file = map_file();
    let map = load_connection_map(map_file.path(), &settings.parse_options()).unwrap();
    let domains =
        parse_domain_list(&format!("north ProdCluster {} weblogic welcome1", server.uri()))
            .unwrap();
    let connector = RestConnector::new(self::settings());
    let engine = RepointEngine::new(&connector, &map).with_config(EngineConfig::from(&settings));
    let mut audit = AuditLog::new();

    let report = engine.run(&domains, &mut audit).await;

    assert_eq!(report.domains[0].outcome, DomainOutcome::DryRun);
    assert_eq!(report.domains[0].planned, vec!["OrdersDS".to_string()]);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn test_unreachable_domain_does_not_stop_batch() {
    let server = MockServer::start().await;
    mount_domain(&server).await;
    mount_change_manager(&server, "startEdit", 2).await;
    mount_change_manager(&server, "activate", 2).await;
    Mock::given(method("POST"))
        .and(path(format!("{RESOURCES}/OrdersDS/JDBCResource/JDBCDriverParams")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{RESOURCES}/OrdersDS")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let map_file = map_file();
    let map = load_connection_map(map_file.path(), &ParseOptions::default()).unwrap();
    // Nothing listens on port 9 of localhost
    let domains = parse_domain_list(&format!(
        "dead DeadCluster http://127.0.0.1:9 weblogic welcome1\n\
         north ProdCluster {} weblogic welcome1\n",
        server.uri()
    ))
    .unwrap();
    let connector = RestConnector::new(settings());
    let engine = RepointEngine::new(&connector, &map);
    let mut audit = AuditLog::new();

    let report = engine.run(&domains, &mut audit).await;

    assert_eq!(report.domains[0].outcome, DomainOutcome::ConnectFailed);
    assert_eq!(report.domains[1].outcome, DomainOutcome::Completed);
    assert_eq!(report.total_retargeted(), 1);
    assert!(report.has_failures());
}
