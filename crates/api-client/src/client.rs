//! Extraction client implementation

use crate::config::ClientConfig;
use crate::error::{ClientResult, ExtractionError};
use crate::nutrients::ExtractionResult;
use crate::state::ExtractionClientState;
use nutrivision_image::CapturedImage;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Multipart field name every image is sent under
pub const FILES_FIELD: &str = "files";

/// Client for the remote nutrient extraction service.
///
/// Each [`submit`](Self::submit) sends one multipart POST and waits for the
/// response; there is no retry. The client owns its
/// [`ExtractionClientState`]; observers get a read-only view through
/// [`subscribe`](Self::subscribe).
///
/// Only one submission may be in flight. A second call while one is running
/// fails with [`ExtractionError::Busy`] and leaves the running one alone.
/// [`reset`](Self::reset) abandons the running submission: its outcome is
/// still returned to its caller but never recorded.
pub struct ExtractionClient {
    inner: Client,
    config: ClientConfig,
    state: watch::Sender<ExtractionClientState>,
    /// Generation of the submission in flight, 0 when none.
    /// Only changed while holding the state channel's write lock.
    active: AtomicU64,
    generations: AtomicU64,
}

impl ExtractionClient {
    /// Create a new client with configuration from environment
    pub fn new() -> ClientResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        // No Content-Type here: reqwest sets the multipart boundary per request.
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("nutrivision-client/", env!("CARGO_PKG_VERSION"))),
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ExtractionError::config(e.to_string()))?;

        let (state, _) = watch::channel(ExtractionClientState::idle());

        Ok(Self {
            inner,
            config,
            state,
            active: AtomicU64::new(0),
            generations: AtomicU64::new(0),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the endpoint URL
    #[must_use]
    pub fn endpoint_url(&self) -> &str {
        &self.config.endpoint_url
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> ExtractionClientState {
        self.state.borrow().clone()
    }

    /// Receive every state change from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ExtractionClientState> {
        self.state.subscribe()
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn is_uploading(&self) -> bool {
        self.active.load(Ordering::Acquire) != 0
    }

    /// Return to idle, dropping any stored result or error.
    ///
    /// A submission still in flight is abandoned: the guard is released and
    /// its outcome will not overwrite the idle state.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            let abandoned = self.active.swap(0, Ordering::AcqRel);
            if abandoned != 0 {
                debug!(generation = abandoned, "Abandoning in-flight submission");
            }
            *state = ExtractionClientState::idle();
        });
        debug!("Extraction state reset");
    }

    /// Record the final `next` state and release the guard, if submission
    /// `generation` still owns it.
    fn record(&self, generation: u64, next: ExtractionClientState) -> bool {
        self.state.send_if_modified(|state| {
            if self
                .active
                .compare_exchange(generation, 0, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Upload `images` and return the parsed extraction result.
    ///
    /// The outcome is both returned and recorded in the client state.
    #[instrument(skip(self, images), fields(count = images.len(), request_id))]
    pub async fn submit(&self, images: &[CapturedImage]) -> ClientResult<ExtractionResult> {
        let generation = self.generations.fetch_add(1, Ordering::AcqRel) + 1;
        let claimed = self.state.send_if_modified(|state| {
            if self
                .active
                .compare_exchange(0, generation, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return false;
            }
            *state = ExtractionClientState::uploading();
            true
        });
        if !claimed {
            warn!("Submission rejected, an upload is already in flight");
            return Err(ExtractionError::Busy);
        }

        let mut guard = InFlight {
            client: self,
            generation,
            finished: false,
        };

        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let start = Instant::now();
        let outcome = self.upload(&request_id, images).await;
        let elapsed = start.elapsed();

        match &outcome {
            Ok(result) => {
                info!(
                    request_id = %request_id,
                    nutrients = result.combined.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Extraction succeeded"
                );
                if !self.record(
                    generation,
                    ExtractionClientState::succeeded(result.clone(), images.to_vec()),
                ) {
                    debug!(request_id = %request_id, "Outcome not recorded, client was reset");
                }
            }
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    error = %e,
                    elapsed_ms = elapsed.as_millis(),
                    "Extraction failed"
                );
                if !self.record(generation, ExtractionClientState::failed(e.to_string())) {
                    debug!(request_id = %request_id, "Outcome not recorded, client was reset");
                }
            }
        }

        guard.finished = true;
        outcome
    }

    async fn upload(
        &self,
        request_id: &str,
        images: &[CapturedImage],
    ) -> ClientResult<ExtractionResult> {
        if images.is_empty() {
            return Err(ExtractionError::EmptyBatch);
        }

        let mut form = Form::new();
        for image in images {
            form = form.part(FILES_FIELD, read_part(image).await?);
        }

        debug!(
            request_id = %request_id,
            url = %self.config.endpoint_url,
            parts = images.len(),
            "Sending extraction request"
        );

        let response = self
            .inner
            .post(&self.config.endpoint_url)
            .header(X_REQUEST_ID, request_id)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractionError::NetworkUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::NetworkUnreachable(e.to_string()))?;

        ExtractionResult::from_slice(&body)
    }
}

impl std::fmt::Debug for ExtractionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionClient")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Releases the in-flight guard if this submission still holds it; a
/// submission dropped before finishing is recorded as failed so the state
/// never stays `uploading`.
struct InFlight<'a> {
    client: &'a ExtractionClient,
    generation: u64,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let client = self.client;
        let generation = self.generation;
        let finished = self.finished;
        client.state.send_if_modified(|state| {
            if client
                .active
                .compare_exchange(generation, 0, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return false;
            }
            if finished {
                return false;
            }
            *state = ExtractionClientState::failed("Upload cancelled");
            true
        });
    }
}

async fn read_part(image: &CapturedImage) -> ClientResult<Part> {
    let path = image
        .local_path()
        .ok_or_else(|| ExtractionError::unreadable(&image.uri, "not a local file"))?;

    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| ExtractionError::unreadable(&image.uri, e.to_string()))?;

    let file_name = image.upload_file_name();
    let content_type = image.upload_content_type();

    Part::bytes(data)
        .file_name(file_name.clone())
        .mime_str(&content_type)
        .map_err(|e| ExtractionError::InvalidPart {
            name: file_name,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Status;

    fn client() -> ExtractionClient {
        ExtractionClient::with_config(ClientConfig::development()).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.state().status(), Status::Idle);
        assert!(!client.is_uploading());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::default().with_endpoint_url("ftp://example.com");
        assert!(matches!(
            ExtractionClient::with_config(config),
            Err(ExtractionError::Config(_))
        ));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let client = client();
        client.reset();
        client.reset();
        let state = client.state();
        assert_eq!(state.status(), Status::Idle);
        assert!(state.result().is_none());
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_empty_batch_fails_without_network() {
        let client = client();
        let err = client.submit(&[]).await.unwrap_err();
        assert_eq!(err, ExtractionError::EmptyBatch);

        let state = client.state();
        assert_eq!(state.status(), Status::Failed);
        assert_eq!(state.error(), Some("No images to upload"));
        assert!(!client.is_uploading());
    }

    #[tokio::test]
    async fn test_platform_asset_is_unreadable() {
        let client = client();
        let err = client
            .submit(&[CapturedImage::label("ph://ABC/L0/001")])
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnreadableSource { .. }));
        assert_eq!(client.state().status(), Status::Failed);
    }

    #[tokio::test]
    async fn test_bad_content_type_is_invalid_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let image = CapturedImage::label(path.to_string_lossy()).with_content_type("not a mime");
        let err = client().submit(&[image]).await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPart { .. }));
    }

    #[tokio::test]
    async fn test_dropped_submission_is_recorded_as_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = ClientConfig::default().with_endpoint_url(format!("http://{addr}/extract/"));
        let client = ExtractionClient::with_config(config).unwrap();
        let images = [CapturedImage::label(path.to_string_lossy())];

        let submit = client.submit(&images);
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(50), submit).await;
        assert!(timed_out.is_err());

        assert!(!client.is_uploading());
        assert_eq!(client.state().error(), Some("Upload cancelled"));
    }
}
