//! Tests for Firestore client functionality.

use std::collections::HashMap;
use std::time::Duration;

use serial_test::serial;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{FirestoreClient, FirestoreConfig};
use crate::error::FirestoreError;
use crate::retry::RetryConfig;
use crate::types::{ToFirestoreValue, Value, Write};

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status_429() {
    let err = FirestoreError::from_http_status(429, "rate limited");
    assert!(matches!(err, FirestoreError::RateLimited(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_500() {
    let err = FirestoreError::from_http_status(500, "internal error");
    assert!(matches!(err, FirestoreError::ServerError(500, _)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_503() {
    let err = FirestoreError::from_http_status(503, "service unavailable");
    assert!(matches!(err, FirestoreError::ServerError(503, _)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_400() {
    let err = FirestoreError::from_http_status(400, "bad request");
    assert!(matches!(err, FirestoreError::RequestFailed(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_404() {
    let err = FirestoreError::from_http_status(404, "not found");
    assert!(matches!(err, FirestoreError::NotFound(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_409() {
    let err = FirestoreError::from_http_status(409, "conflict");
    assert!(matches!(err, FirestoreError::AlreadyExists(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_412() {
    let err = FirestoreError::from_http_status(412, "precondition");
    assert!(err.is_precondition_failed());
    assert!(!err.is_retryable());
}

#[test]
fn test_error_http_status_getter() {
    assert_eq!(FirestoreError::RateLimited(1000).http_status(), Some(429));
    assert_eq!(
        FirestoreError::ServerError(502, "bad gateway".into()).http_status(),
        Some(502)
    );
    assert_eq!(
        FirestoreError::NotFound("doc".into()).http_status(),
        Some(404)
    );
}

#[test]
fn test_error_retry_after_ms() {
    assert_eq!(FirestoreError::RateLimited(5000).retry_after_ms(), Some(5000));
    assert_eq!(
        FirestoreError::ServerError(500, "error".into()).retry_after_ms(),
        None
    );
}

// =============================================================================
// Retry Policy Tests
// =============================================================================

#[tokio::test]
async fn test_retry_logic_retries_on_server_errors() {
    let err = FirestoreError::from_http_status(500, "Internal Server Error");
    assert!(err.is_retryable(), "500 errors should be retryable");

    let err = FirestoreError::from_http_status(502, "Bad Gateway");
    assert!(err.is_retryable(), "502 errors should be retryable");

    let err = FirestoreError::from_http_status(503, "Service Unavailable");
    assert!(err.is_retryable(), "503 errors should be retryable");

    let err = FirestoreError::from_http_status(429, "Too Many Requests");
    assert!(err.is_retryable(), "429 errors should be retryable");
}

#[tokio::test]
async fn test_no_retry_on_conflict() {
    let err = FirestoreError::from_http_status(409, "conflict");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_retry_honors_rate_limit() {
    let err = FirestoreError::RateLimited(2000);
    assert!(err.is_retryable());
    assert_eq!(err.retry_after_ms(), Some(2000));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
#[serial]
fn test_config_validates_empty_project_id() {
    std::env::set_var("GCP_PROJECT_ID", "");
    std::env::remove_var("FIREBASE_PROJECT_ID");
    let result = FirestoreConfig::from_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_config_accepts_firebase_project_id() {
    std::env::remove_var("GCP_PROJECT_ID");
    std::env::set_var("FIREBASE_PROJECT_ID", "firebase-project");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.project_id, "firebase-project");
}

#[test]
#[serial]
fn test_config_prefers_gcp_project_id() {
    std::env::set_var("GCP_PROJECT_ID", "gcp-project");
    std::env::set_var("FIREBASE_PROJECT_ID", "firebase-project");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.project_id, "gcp-project");
}

#[test]
#[serial]
fn test_config_parses_timeout_env_vars() {
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("FIRESTORE_CONNECT_TIMEOUT_SECS", "15");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.connect_timeout, Duration::from_secs(15));
    std::env::remove_var("FIRESTORE_CONNECT_TIMEOUT_SECS");
}

#[test]
#[serial]
fn test_config_parses_retry_env_vars() {
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("FIRESTORE_RETRY_BASE_MS", "50");
    std::env::set_var("FIRESTORE_RETRY_MAX_MS", "2000");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.retry.base_delay_ms, 50);
    assert_eq!(config.retry.max_delay_ms, 2000);
    std::env::remove_var("FIRESTORE_RETRY_BASE_MS");
    std::env::remove_var("FIRESTORE_RETRY_MAX_MS");
}

#[test]
#[serial]
fn test_config_handles_invalid_env_values() {
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("FIRESTORE_CONNECT_TIMEOUT_SECS", "not-a-number");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
    std::env::remove_var("FIRESTORE_CONNECT_TIMEOUT_SECS");
}

#[test]
fn test_retry_config_unaffected_by_defaults() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 3);
}

// =============================================================================
// HTTP Behavior Tests (wiremock standing in for the emulator)
// =============================================================================

async fn mock_client(server: &MockServer) -> FirestoreClient {
    let config = FirestoreConfig {
        project_id: "test-project".to_string(),
        database_id: "(default)".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 0,
            base_delay_ms: 1,
            max_delay_ms: 2,
        },
        emulator_host: Some(server.address().to_string()),
    };
    FirestoreClient::new(config)
        .await
        .expect("Failed to build client")
}

const DOC_PATH: &str = "/v1/projects/test-project/databases/(default)/documents/jobs/job-1";

#[tokio::test]
async fn test_get_document_parses_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "projects/test-project/databases/(default)/documents/jobs/job-1",
            "fields": {"title": {"stringValue": "Backend Engineer"}}
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let doc = client
        .get_document("jobs", "job-1")
        .await
        .expect("Request failed")
        .expect("Document should be found");

    let title = doc
        .fields
        .as_ref()
        .and_then(|f| f.get("title"))
        .and_then(|v| match v {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        });
    assert_eq!(title.as_deref(), Some("Backend Engineer"));
    assert_eq!(doc.doc_id(), Some("job-1"));
}

#[tokio::test]
async fn test_get_document_missing_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let doc = client.get_document("jobs", "job-1").await.expect("Request failed");
    assert!(doc.is_none());
}

#[tokio::test]
async fn test_create_document_conflict_maps_to_already_exists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/test-project/databases/(default)/documents/jobs",
        ))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let mut fields = HashMap::new();
    fields.insert("title".to_string(), "Job".to_firestore_value());

    let result = client.create_document("jobs", "job-1", fields).await;
    assert!(matches!(result, Err(FirestoreError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_batch_write_surfaces_per_write_conflict() {
    let server = MockServer::start().await;

    // HTTP 200 with a failing per-write status, as batchWrite reports it
    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/test-project/databases/(default)/documents:batchWrite",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "writeResults": [{}],
            "status": [{"code": 6, "message": "Document already exists"}]
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let write = Write::create(
        client.full_document_name("applications", "job-1_dev-1"),
        HashMap::new(),
    );

    let result = client.batch_write(vec![write]).await;
    assert!(matches!(result, Err(FirestoreError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_server_error_is_classified_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let err = client.get_document("jobs", "job-1").await.unwrap_err();
    assert!(matches!(err, FirestoreError::ServerError(503, _)));
    assert!(err.is_retryable());
}
