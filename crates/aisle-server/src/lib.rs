//! Aisle server - HTTP surface for the planner assistant
//!
//! `POST /api/assistant` authenticates the caller, validates the body and
//! streams the session as server-sent events. `GET /health` answers 200.

pub mod error;

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use aisle_core::encoder::event_stream;
use aisle_core::prompt::SystemPrompt;
use aisle_core::session::{AgentLoop, AssistantRequest};

pub use error::ApiError;

/// Health endpoint path.
pub const HEALTH_PATH: &str = "/health";
/// Assistant streaming endpoint path.
pub const ASSISTANT_PATH: &str = "/api/assistant";

/// Shared, read-only state for every request
#[derive(Clone)]
pub struct AppState {
    pub agent: AgentLoop,
    /// Secret callers must present; `None` rejects every request
    pub secret: Option<Arc<str>>,
    /// Base instructions the per-request prompt is built from
    pub prompt_base: Arc<str>,
    /// Per-request event channel capacity
    pub event_buffer: usize,
}

impl AppState {
    pub fn new(agent: AgentLoop) -> Self {
        Self {
            agent,
            secret: None,
            prompt_base: Arc::from(aisle_core::prompt::DEFAULT_SYSTEM_PROMPT),
            event_buffer: 32,
        }
    }

    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.map(Arc::from);
        self
    }

    pub fn with_prompt_base(mut self, base: impl Into<String>) -> Self {
        self.prompt_base = Arc::from(base.into());
        self
    }

    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer;
        self
    }
}

/// Build the server routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(ASSISTANT_PATH, post(assistant))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn assistant(
    State(st): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    authorize(&headers, st.secret.as_deref())?;

    let request: AssistantRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    request.validate().map_err(ApiError::BadRequest)?;

    let system = SystemPrompt::with_base(st.prompt_base.as_ref())
        .with_today()
        .with_view(request.view())
        .build();
    debug!(messages = request.messages.len(), view = ?request.view(), "Accepted assistant request");

    let rx = st.agent.start(request.history(), system, st.event_buffer);
    Ok(sse_response(event_stream(rx).map(Ok::<Bytes, Infallible>)))
}

/// Check the `Authorization: Bearer <secret>` header
///
/// Without a configured secret every request is rejected.
fn authorize(headers: &HeaderMap, secret: Option<&str>) -> Result<(), ApiError> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match (secret, presented) {
        (Some(secret), Some(presented)) if digests_match(presented, secret) => Ok(()),
        (secret, presented) => {
            warn!(
                secret_configured = secret.is_some(),
                credential_present = presented.is_some(),
                "Rejected assistant request"
            );
            Err(ApiError::Unauthorized)
        }
    }
}

/// Compare SHA-256 digests so timing does not depend on the secret's bytes
fn digests_match(presented: &str, secret: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(secret.as_bytes())
}

fn sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, Body::from_stream(stream)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authorize() {
        assert!(authorize(&bearer("Bearer s3cret"), Some("s3cret")).is_ok());
        assert!(authorize(&bearer("Bearer s3cret2"), Some("s3cret")).is_err());
        assert!(authorize(&bearer("Bearer wrong"), Some("s3cret")).is_err());
        assert!(authorize(&bearer("s3cret"), Some("s3cret")).is_err());
        assert!(authorize(&HeaderMap::new(), Some("s3cret")).is_err());
    }

    #[test]
    fn test_authorize_without_secret_rejects() {
        assert!(authorize(&HeaderMap::new(), None).is_err());
        assert!(authorize(&bearer("Bearer anything"), None).is_err());
        assert!(authorize(&bearer("Bearer "), None).is_err());
    }
}
