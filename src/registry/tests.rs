//! Tests for the registry module

use super::*;
use crate::config::{HttpSettings, Secret};
use crate::error::Error;
use crate::types::BackoffType;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADMIN: &str = "t3://admin:7001";
const DRIVER: &str = "oracle.jdbc.OracleDriver";

fn domain(admin_url: &str) -> DomainConfig {
    DomainConfig {
        block: "north".to_string(),
        cluster: "ClusterA".to_string(),
        admin_url: admin_url.to_string(),
        username: "weblogic".to_string(),
        password: Secret::new("s3cret"),
    }
}

fn registry() -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    registry.add_datasource(
        ADMIN,
        DatasourceRecord::new("DS1", DRIVER, "jdbc:oracle:thin:@h:1521/ORCL"),
        vec![TargetDescriptor::cluster("OldCluster")],
    );
    registry
}

// ============================================================================
// In-memory registry
// ============================================================================

#[tokio::test]
async fn test_memory_edits_visible_only_after_activate() {
    let registry = registry();
    let mut session = registry.connect(&domain(ADMIN)).await.unwrap();

    session.begin_edit().await.unwrap();
    session.set_url("DS1", "jdbc:new").await.unwrap();
    session.clear_targets("DS1").await.unwrap();

    let committed = registry.datasource(ADMIN, "DS1").unwrap();
    assert_eq!(committed.record.current_url, "jdbc:oracle:thin:@h:1521/ORCL");
    assert_eq!(committed.targets.len(), 1);

    let staged = session.list_datasources().await.unwrap();
    assert_eq!(staged[0].current_url, "jdbc:new");

    session.activate().await.unwrap();
    let committed = registry.datasource(ADMIN, "DS1").unwrap();
    assert_eq!(committed.record.current_url, "jdbc:new");
    assert!(committed.targets.is_empty());
}

#[tokio::test]
async fn test_memory_disconnect_discards_pending_edits() {
    let registry = registry();
    let mut session = registry.connect(&domain(ADMIN)).await.unwrap();

    session.begin_edit().await.unwrap();
    session
        .set_target("DS1", &TargetDescriptor::cluster("ClusterA"))
        .await
        .unwrap();
    session.disconnect().await.unwrap();

    let committed = registry.datasource(ADMIN, "DS1").unwrap();
    assert_eq!(committed.targets, vec![TargetDescriptor::cluster("OldCluster")]);
}

#[tokio::test]
async fn test_memory_mutation_requires_edit_session() {
    let registry = registry();
    let mut session = registry.connect(&domain(ADMIN)).await.unwrap();

    let err = session.set_url("DS1", "jdbc:new").await.unwrap_err();
    assert!(matches!(err, Error::NoEditSession));
    assert!(matches!(session.activate().await, Err(Error::NoEditSession)));
}

#[tokio::test]
async fn test_memory_unknown_datasource() {
    let registry = registry();
    let mut session = registry.connect(&domain(ADMIN)).await.unwrap();
    session.begin_edit().await.unwrap();

    let err = session.set_url("NOPE", "jdbc:new").await.unwrap_err();
    assert!(matches!(err, Error::DatasourceNotFound { name } if name == "NOPE"));
}

#[tokio::test]
async fn test_memory_injected_failures() {
    let registry = registry();
    registry.fail_on(ADMIN, FailOn::SetUrl("DS1".to_string()));
    registry.fail_on(ADMIN, FailOn::Activate(1));

    let mut session = registry.connect(&domain(ADMIN)).await.unwrap();
    session.begin_edit().await.unwrap();
    assert!(session.set_url("DS1", "jdbc:new").await.is_err());
    assert!(session.activate().await.is_err());

    session.begin_edit().await.unwrap();
    session.activate().await.unwrap();
}

#[tokio::test]
async fn test_memory_unknown_domain() {
    let registry = registry();
    let result = registry.connect(&domain("t3://elsewhere:7001")).await;
    assert!(matches!(result, Err(Error::Registry { .. })));
}

#[tokio::test]
async fn test_memory_journal_order() {
    let registry = registry();
    let mut session = registry.connect(&domain(ADMIN)).await.unwrap();
    session.begin_edit().await.unwrap();
    session.list_datasources().await.unwrap();
    session.activate().await.unwrap();
    session.disconnect().await.unwrap();

    assert_eq!(
        registry.journal(ADMIN),
        vec![
            Operation::Connect,
            Operation::BeginEdit,
            Operation::List,
            Operation::Activate,
            Operation::Disconnect,
        ]
    );
}

// ============================================================================
// REST registry
// ============================================================================

const ROOT: &str = "/management/weblogic/latest";

fn fast_settings() -> HttpSettings {
    HttpSettings {
        timeout_secs: 5,
        max_retries: 1,
        initial_backoff_ms: 5,
        max_backoff_ms: 5,
        backoff: BackoffType::Constant,
        requested_by: "tests".to_string(),
    }
}

async fn mount_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/edit")))
        .and(basic_auth("weblogic", "s3cret"))
        .and(header("X-Requested-By", "tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "base_domain"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_rest_connect_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/edit")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let connector = RestConnector::new(fast_settings());
    let result = connector.connect(&domain(&server.uri())).await;
    assert!(matches!(result, Err(Error::HttpStatus { status: 401, .. })));
}

#[tokio::test]
async fn test_rest_list_datasources() {
    let server = MockServer::start().await;
    mount_probe(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/edit/JDBCSystemResources")))
        .and(query_param("fields", "name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "DS1"}, {"name": "Mail Session"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "{ROOT}/edit/JDBCSystemResources/DS1/JDBCResource/JDBCDriverParams"
        )))
        .and(query_param("fields", "url,driverName"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "jdbc:oracle:thin:@h:1521/ORCL",
            "driverName": DRIVER
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "{ROOT}/edit/JDBCSystemResources/Mail%20Session/JDBCResource/JDBCDriverParams"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": null})))
        .mount(&server)
        .await;

    let connector = RestConnector::new(fast_settings());
    let mut session = connector.connect(&domain(&server.uri())).await.unwrap();
    let records = session.list_datasources().await.unwrap();

    assert_eq!(
        records,
        vec![
            DatasourceRecord::new("DS1", DRIVER, "jdbc:oracle:thin:@h:1521/ORCL"),
            DatasourceRecord::without_driver("Mail Session", ""),
        ]
    );
}

#[tokio::test]
async fn test_rest_edit_cycle() {
    let server = MockServer::start().await;
    mount_probe(&server).await;

    for action in ["startEdit", "activate"] {
        Mock::given(method("POST"))
            .and(path(format!("{ROOT}/edit/changeManager/{action}")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path(format!(
            "{ROOT}/edit/JDBCSystemResources/DS1/JDBCResource/JDBCDriverParams"
        )))
        .and(body_json(json!({"url": "jdbc:new"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}/edit/JDBCSystemResources/DS1")))
        .and(body_json(json!({"targets": []})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}/edit/JDBCSystemResources/DS1")))
        .and(body_json(json!({
            "targets": [{"identity": ["clusters", "ClusterA"]}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RestConnector::new(fast_settings());
    let mut session = connector.connect(&domain(&server.uri())).await.unwrap();

    session.begin_edit().await.unwrap();
    session.set_url("DS1", "jdbc:new").await.unwrap();
    session.clear_targets("DS1").await.unwrap();
    session
        .set_target("DS1", &TargetDescriptor::cluster("ClusterA"))
        .await
        .unwrap();
    session.activate().await.unwrap();
    session.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_rest_disconnect_cancels_open_edit() {
    let server = MockServer::start().await;
    mount_probe(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}/edit/changeManager/startEdit")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{ROOT}/edit/changeManager/cancelEdit")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let connector = RestConnector::new(fast_settings());
    let mut session = connector.connect(&domain(&server.uri())).await.unwrap();
    session.begin_edit().await.unwrap();
    session.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_rest_mutation_without_edit_session() {
    let server = MockServer::start().await;
    mount_probe(&server).await;

    let connector = RestConnector::new(fast_settings());
    let mut session = connector.connect(&domain(&server.uri())).await.unwrap();
    let err = session.set_url("DS1", "jdbc:new").await.unwrap_err();
    assert!(matches!(err, Error::NoEditSession));
}
