use crate::common::{create_orchestrator, create_test_config, start_origin};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use linkscope::server::{router, Envelope};
use linkscope::storage::{StorageError, StorageResult};
use linkscope::{BatchOrchestrator, Repository, ResultRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "linkscope-test-boundary";

fn multipart_request(field: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"urls.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = field,
        c = content
    );

    Request::builder()
        .method("POST")
        .uri("/api/v1/links")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Envelope) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let envelope = serde_json::from_slice(&bytes).expect("response should be an envelope");
    (status, envelope)
}

fn create_app() -> Router {
    router(create_orchestrator(&create_test_config("")))
}

fn single_error(envelope: &Envelope) -> &str {
    let errors = envelope.errors.as_ref().expect("expected errors");
    assert_eq!(errors.len(), 1);
    assert!(envelope.data.is_none());
    &errors[0]
}

#[tokio::test]
async fn test_health_check() {
    let response = create_app()
        .oneshot(get_request("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_upload_then_fetch_batch() {
    let origin = start_origin().await;
    let app = create_app();

    let urls = format!("{0}/ok\n{0}/missing", origin.uri());
    let (status, created) = send(app.clone(), multipart_request("urlsFile", &urls)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(created.errors.is_none());
    let results = created.data.expect("expected data").results;
    assert_eq!(results.len(), 2);
    assert_eq!(results.iter().filter(|r| r.success).count(), 1);

    let uri = format!("/api/v1/links/{}", results[0].batch_id);
    let (status, fetched) = send(app, get_request(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched.data.expect("expected data").results, results);
}

#[tokio::test]
async fn test_upload_without_urls_field() {
    let (status, envelope) = send(create_app(), multipart_request("other", "x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(single_error(&envelope), "bad file");
}

#[tokio::test]
async fn test_upload_not_multipart() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/links")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("https://example.com/"))
        .unwrap();

    let (status, envelope) = send(create_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(single_error(&envelope), "bad file");
}

#[tokio::test]
async fn test_upload_invalid_line() {
    let (status, envelope) = send(
        create_app(),
        multipart_request("urlsFile", "https://example.com/\nexample.com"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(single_error(&envelope).starts_with("bad url at line 2"));
}

#[tokio::test]
async fn test_upload_empty_file() {
    let (status, envelope) = send(create_app(), multipart_request("urlsFile", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(single_error(&envelope), "no urls for processing");
}

#[tokio::test]
async fn test_unknown_batch() {
    let (status, envelope) = send(create_app(), get_request("/api/v1/links/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(single_error(&envelope), "batch of results not found");
}

struct BrokenRepository;

impl Repository for BrokenRepository {
    fn create_results(&self, _results: &[ResultRecord]) -> StorageResult<()> {
        Err(StorageError::Database("database is locked".to_string()))
    }

    fn get_batch_results(&self, _batch_id: &str) -> StorageResult<Vec<ResultRecord>> {
        Err(StorageError::Database("database is locked".to_string()))
    }

    fn list_results(&self) -> StorageResult<HashMap<String, Vec<ResultRecord>>> {
        Err(StorageError::Database("database is locked".to_string()))
    }
}

#[tokio::test]
async fn test_storage_failures_are_opaque() {
    let origin = start_origin().await;
    let config = create_test_config("");
    let coordinator = linkscope::crawler::build_coordinator(&config).unwrap();
    let app = router(Arc::new(BatchOrchestrator::new(
        Arc::new(coordinator),
        Arc::new(BrokenRepository),
    )));

    let urls = format!("{}/ok", origin.uri());
    let (status, envelope) = send(app.clone(), multipart_request("urlsFile", &urls)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(single_error(&envelope), "internal server error");

    let (status, envelope) = send(app, get_request("/api/v1/links/anything")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(single_error(&envelope), "internal server error");
}
