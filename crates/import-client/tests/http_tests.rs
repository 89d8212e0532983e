//! HTTP client tests against a mock import API.

use import_client::{HttpImportService, ImportService, ServiceConfig, ServiceError};
use import_common::{CheckStage, EntityKind, ImportField, ImportRecord, ReferenceEntity, Value};
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn service(server: &MockServer) -> HttpImportService {
    HttpImportService::new(&ServiceConfig {
        host: server.uri(),
        api_key: "secret".to_string(),
        pool_id: 12,
        timeout_secs: 5,
    })
    .unwrap()
}

fn record() -> ImportRecord {
    ImportRecord::new()
        .with(ImportField::SiteCode, "S1")
        .with(ImportField::Value, 1.25)
}

// ============================================================================
// check / run
// ============================================================================

#[tokio::test]
async fn test_check_sends_records_with_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data/api/imports/check/12"))
        .and(header("api-key", "API-Key secret"))
        .and(body_json(serde_json::json!([{"site_code": "S1", "value": 1.25}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [{"index": 0, "stage": 1, "status": 1, "fields": ["SiteName", "SiteCode"]}],
            "has_error_message": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = service(&server).check(&[record()]).await.unwrap();
    assert_eq!(results.messages.len(), 1);
    assert_eq!(results.messages[0].stage, CheckStage::METADATA);
    assert!(!results.has_error_message);
}

#[tokio::test]
async fn test_submit_returns_counts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data/api/imports/run/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "imported_sample_count": 1,
            "imported_variant_count": 0,
            "imported_value_count": 1
        })))
        .mount(&server)
        .await;

    let result = service(&server).submit(&[record()]).await.unwrap();
    assert_eq!(result.imported_sample_count, 1);
    assert_eq!(result.imported_value_count, 1);
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data/api/imports/check/12"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = service(&server).check(&[record()]).await.unwrap_err();
    match err {
        ServiceError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data/api/imports/run/12"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = service(&server).submit(&[]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode(_)));
}

// ============================================================================
// Entities and lookups
// ============================================================================

#[tokio::test]
async fn test_list_entities() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/api/parameters/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 3, "name": "Temperature", "unit": "degC"},
            {"id": 4, "name": "Salinity", "unit": "PSU"}
        ])))
        .mount(&server)
        .await;

    let entities = service(&server)
        .list_entities(EntityKind::Parameter)
        .await
        .unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[1].id, Some(4));
    assert_eq!(entities[1].get("unit"), Some(&Value::from("PSU")));
}

#[tokio::test]
async fn test_create_entity_returns_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data/api/laboratories/12"))
        .and(body_json(serde_json::json!({"name": "Lab A"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 77, "name": "Lab A"})),
        )
        .mount(&server)
        .await;

    let created = service(&server)
        .create_entity(
            EntityKind::Laboratory,
            &ReferenceEntity::new().with("name", "Lab A"),
        )
        .await
        .unwrap();
    assert_eq!(created.id, Some(77));
}

#[tokio::test]
async fn test_create_lookup_accepts_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data/api/site-lookups/12"))
        .and(body_json(serde_json::json!({"id": 5, "key": "S1", "pool_id": 12})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    service(&server)
        .create_lookup(EntityKind::Site, "S1", 5)
        .await
        .unwrap();
}
