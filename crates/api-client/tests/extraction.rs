//! End-to-end tests against a mock extraction endpoint.

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use nutrivision_client::{ClientConfig, ExtractionClient, ExtractionError, Status, FILES_FIELD};
use nutrivision_image::CapturedImage;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Clone)]
struct SeenPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    len: usize,
}

#[derive(Debug, Clone)]
struct SeenRequest {
    accept: Option<String>,
    content_type: Option<String>,
    request_id: Option<String>,
    parts: Vec<SeenPart>,
}

#[derive(Clone)]
struct Mock {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    status: StatusCode,
    body: &'static str,
    gate: Option<Arc<Notify>>,
}

impl Mock {
    fn new(status: StatusCode, body: &'static str) -> Self {
        Self {
            seen: Arc::default(),
            status,
            body,
            gate: None,
        }
    }

    fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

const OK_BODY: &str =
    r#"{"combined": {"carbs_total": "30g", "protein_total": "4.5g", "sodium_total": "500mg"}}"#;

fn header_str(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn extract(State(mock): State<Mock>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let len = field.bytes().await.unwrap().len();
        parts.push(SeenPart {
            name,
            file_name,
            content_type,
            len,
        });
    }

    mock.seen.lock().unwrap().push(SeenRequest {
        accept: header_str(&headers, header::ACCEPT),
        content_type: header_str(&headers, header::CONTENT_TYPE),
        request_id: header_str(&headers, "x-request-id"),
        parts,
    });

    if let Some(gate) = &mock.gate {
        gate.notified().await;
    }

    (
        mock.status,
        [(header::CONTENT_TYPE, "application/json")],
        mock.body,
    )
        .into_response()
}

async fn serve(mock: Mock) -> ExtractionClient {
    let app = Router::new()
        .route("/extract/", post(extract))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig::default().with_endpoint_url(format!("http://{addr}/extract/"));
    ExtractionClient::with_config(config).unwrap()
}

fn write_image(dir: &Path, name: &str, bytes: &[u8]) -> CapturedImage {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    CapturedImage::label(path.to_string_lossy())
}

#[tokio::test]
async fn test_one_post_with_a_files_part_per_image() {
    let mock = Mock::new(StatusCode::OK, OK_BODY);
    let client = serve(mock.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let images = [
        write_image(dir.path(), "label.jpg", b"first"),
        write_image(dir.path(), "apple.png", b"second!"),
        CapturedImage::fruit(dir.path().join("pear").to_string_lossy()),
    ];
    std::fs::write(dir.path().join("pear"), b"third").unwrap();

    let result = assert_ok!(client.submit(&images).await);
    assert_eq!(result.combined.len(), 3);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert_eq!(request.parts.len(), 3);
    assert!(request.parts.iter().all(|p| p.name == FILES_FIELD));

    let names: Vec<_> = request.parts.iter().map(|p| p.file_name.clone().unwrap()).collect();
    assert_eq!(names, ["label.jpg", "apple.png", "pear"]);
    let types: Vec<_> = request.parts.iter().map(|p| p.content_type.clone().unwrap()).collect();
    assert_eq!(types, ["image/jpeg", "image/png", "image/jpeg"]);
    let lens: Vec<_> = request.parts.iter().map(|p| p.len).collect();
    assert_eq!(lens, [5, 7, 5]);
}

#[tokio::test]
async fn test_headers_accept_json_and_multipart_boundary() {
    let mock = Mock::new(StatusCode::OK, OK_BODY);
    let client = serve(mock.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    assert_ok!(client.submit(&[write_image(dir.path(), "a.jpg", b"a")]).await);

    let request = &mock.requests()[0];
    assert_eq!(request.accept.as_deref(), Some("application/json"));
    let content_type = request.content_type.clone().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    assert!(content_type.contains("boundary="));
    assert!(request.request_id.is_some());
}

#[tokio::test]
async fn test_success_state_and_normalized_totals() {
    let client = serve(Mock::new(StatusCode::OK, OK_BODY)).await;
    let dir = tempfile::tempdir().unwrap();
    let images = [write_image(dir.path(), "a.jpg", b"a")];

    let result = assert_ok!(client.submit(&images).await);
    let totals = result.totals().unwrap();
    assert_eq!(totals.sodium, 0.5);
    assert_eq!(totals.carbs, 30.0);

    let state = client.state();
    assert_eq!(state.status(), Status::Success);
    assert_eq!(state.result(), Some(&result));
    assert!(state.error().is_none());
    assert_eq!(state.images(), &images);
}

#[tokio::test]
async fn test_server_error_is_http_status() {
    let client = serve(Mock::new(StatusCode::INTERNAL_SERVER_ERROR, "{}")).await;
    let dir = tempfile::tempdir().unwrap();

    let err = assert_err!(client.submit(&[write_image(dir.path(), "a.jpg", b"a")]).await);
    assert_eq!(err, ExtractionError::HttpStatus(500));

    let state = client.state();
    assert_eq!(state.status(), Status::Failed);
    assert!(state.result().is_none());
    assert_eq!(state.error(), Some(err.to_string().as_str()));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let client = serve(Mock::new(StatusCode::OK, "<html>oops</html>")).await;
    let dir = tempfile::tempdir().unwrap();

    let err = assert_err!(client.submit(&[write_image(dir.path(), "a.jpg", b"a")]).await);
    assert!(matches!(err, ExtractionError::MalformedResponse(_)));
    assert_eq!(client.state().status(), Status::Failed);
}

#[tokio::test]
async fn test_missing_combined_is_malformed() {
    let client = serve(Mock::new(StatusCode::OK, r#"{"results": []}"#)).await;
    let dir = tempfile::tempdir().unwrap();

    let err = assert_err!(client.submit(&[write_image(dir.path(), "a.jpg", b"a")]).await);
    assert!(matches!(err, ExtractionError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_empty_batch_makes_no_request() {
    let mock = Mock::new(StatusCode::OK, OK_BODY);
    let client = serve(mock.clone()).await;

    let err = assert_err!(client.submit(&[]).await);
    assert_eq!(err, ExtractionError::EmptyBatch);
    assert!(mock.requests().is_empty());
    assert_eq!(client.state().status(), Status::Failed);
}

#[tokio::test]
async fn test_unreadable_source_fails_before_sending() {
    let mock = Mock::new(StatusCode::OK, OK_BODY);
    let client = serve(mock.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let images = [
        write_image(dir.path(), "a.jpg", b"a"),
        CapturedImage::label(dir.path().join("missing.jpg").to_string_lossy()),
    ];
    let err = assert_err!(client.submit(&images).await);
    assert!(matches!(err, ExtractionError::UnreadableSource { .. }));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_network_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::default().with_endpoint_url(format!("http://{addr}/extract/"));
    let client = ExtractionClient::with_config(config).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = assert_err!(client.submit(&[write_image(dir.path(), "a.jpg", b"a")]).await);
    assert!(matches!(err, ExtractionError::NetworkUnreachable(_)));
    assert!(client.state().error().unwrap().contains("unreachable"));
}

#[tokio::test]
async fn test_second_submit_while_uploading_is_rejected() {
    let gate = Arc::new(Notify::new());
    let mut mock = Mock::new(StatusCode::OK, OK_BODY);
    mock.gate = Some(gate.clone());
    let client = Arc::new(serve(mock.clone()).await);
    let dir = tempfile::tempdir().unwrap();
    let first = vec![write_image(dir.path(), "a.jpg", b"a")];
    let second = [write_image(dir.path(), "b.jpg", b"b")];

    let mut states = client.subscribe();
    let running = tokio::spawn({
        let client = client.clone();
        async move { client.submit(&first).await }
    });
    states.wait_for(|s| s.status() == Status::Uploading).await.unwrap();

    let err = assert_err!(client.submit(&second).await);
    assert_eq!(err, ExtractionError::Busy);
    assert_eq!(client.state().status(), Status::Uploading);
    assert!(client.is_uploading());

    gate.notify_one();
    assert_ok!(running.await.unwrap());

    assert_eq!(client.state().status(), Status::Success);
    assert_eq!(mock.requests().len(), 1);
    assert!(!client.is_uploading());
}

#[tokio::test]
async fn test_next_submission_replaces_previous_outcome() {
    let client = serve(Mock::new(StatusCode::OK, OK_BODY)).await;
    let dir = tempfile::tempdir().unwrap();

    assert_err!(client.submit(&[]).await);
    assert_eq!(client.state().status(), Status::Failed);

    assert_ok!(client.submit(&[write_image(dir.path(), "a.jpg", b"a")]).await);
    let state = client.state();
    assert_eq!(state.status(), Status::Success);
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_reset_twice_returns_to_idle() {
    let client = serve(Mock::new(StatusCode::OK, OK_BODY)).await;
    let dir = tempfile::tempdir().unwrap();
    assert_ok!(client.submit(&[write_image(dir.path(), "a.jpg", b"a")]).await);

    client.reset();
    client.reset();

    let state = client.state();
    assert_eq!(state.status(), Status::Idle);
    assert!(state.result().is_none());
    assert!(state.error().is_none());
    assert!(state.images().is_empty());
}

#[tokio::test]
async fn test_reset_during_upload_releases_guard_and_drops_stale_outcome() {
    let gate = Arc::new(Notify::new());
    let mut mock = Mock::new(StatusCode::OK, OK_BODY);
    mock.gate = Some(gate.clone());
    let client = Arc::new(serve(mock.clone()).await);
    let dir = tempfile::tempdir().unwrap();
    let first = vec![write_image(dir.path(), "a.jpg", b"a")];

    let mut states = client.subscribe();
    let running = tokio::spawn({
        let client = client.clone();
        async move { client.submit(&first).await }
    });
    states.wait_for(|s| s.status() == Status::Uploading).await.unwrap();

    client.reset();
    assert_eq!(client.state().status(), Status::Idle);
    assert!(!client.is_uploading());
    states.borrow_and_update();

    // The abandoned caller still gets its result, but the state stays idle.
    gate.notify_one();
    assert_ok!(running.await.unwrap());
    assert!(!states.has_changed().unwrap());
    assert_eq!(client.state().status(), Status::Idle);
    assert!(client.state().result().is_none());
    assert!(!client.is_uploading());

    gate.notify_one();
    assert_ok!(client.submit(&[write_image(dir.path(), "b.jpg", b"b")]).await);
    assert_eq!(client.state().status(), Status::Success);
    assert_eq!(mock.requests().len(), 2);
}
