//! Mock Slack API server
//!
//! One axum listener with a catch-all route: every request is answered
//! with Slack's generic success envelope (or a registered override merged
//! over it), and calls under the API prefix are recorded and classified
//! into the shared session state before responding.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use dashmap::DashMap;
use http::{StatusCode, Uri};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::error::HarnessError;
use crate::harness::{InterceptFn, SessionState};
use crate::logic::classify::{API_PREFIX, ClassifiedRequest, classify, decode_form};
use crate::types::{ActiveScreen, MessageLogItem, RequestLogItem};

/// Header identifying responses as coming from the mock, not real Slack
pub const MOCK_MARKER_HEADER: &str = "x-powered-by";
pub const MOCK_MARKER_VALUE: &str = "slack-testkit";

/// Shared state behind the catch-all route
#[derive(Clone)]
pub(crate) struct MockState {
    pub session: Arc<Mutex<SessionState>>,
    pub intercepts: Arc<DashMap<String, InterceptFn>>,
}

/// Owned handle for a running mock server
pub(crate) struct ServerGuard {
    pub addr: SocketAddr,
    handle: axum_server::Handle,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerGuard {
    /// Stop the listener and wait for the serve task to exit
    ///
    /// Connections still open are closed rather than drained; a test
    /// teardown has nothing worth waiting for.
    pub async fn shutdown(self) {
        self.handle.shutdown();
        match self.task.await {
            Ok(Ok(())) => trace!("Mock Slack server stopped"),
            Ok(Err(error)) => warn!(error = %error, "Mock Slack server exited with an error"),
            Err(error) => warn!(error = %error, "Mock Slack server task failed"),
        }
    }
}

/// Bind the mock Slack API on the given port and start serving
///
/// Resolves once the listener is accepting connections. Port 0 binds an
/// ephemeral port; the actual address is in the returned guard.
pub(crate) async fn start_server(
    port: u16,
    state: MockState,
) -> Result<ServerGuard, HarnessError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let handle = axum_server::Handle::new();

    let router = Router::new().fallback(handle_request).with_state(state);

    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(router.into_make_service());
    let task = tokio::spawn(server);

    match handle.listening().await {
        Some(addr) => {
            trace!(addr = %addr, "Mock Slack server listening");
            Ok(ServerGuard { addr, handle, task })
        }
        None => {
            let error = match task.await {
                Ok(Err(error)) => error,
                Ok(Ok(())) => std::io::Error::other("server exited before listening"),
                Err(join_error) => std::io::Error::other(join_error),
            };
            Err(HarnessError::Bind(error))
        }
    }
}

/// Catch-all handler: record, classify, respond
async fn handle_request(State(state): State<MockState>, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    if path.is_empty() {
        warn!("Rejecting request without a path");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "request has no path");
    }

    let data = decode_form(&body);

    if path.starts_with(API_PREFIX) {
        trace!(path = %path, "Intercepted Slack API call");

        // One guard across record and classify: concurrent requests must
        // not interleave their log and screen updates.
        let mut session = state.session.lock();
        session.request_log.push(RequestLogItem {
            url: path.clone(),
            data: data.clone(),
        });
        match classify(&path, &data) {
            Ok(ClassifiedRequest::View { view }) => {
                session.active_screen = Some(ActiveScreen::View(view));
            }
            Ok(ClassifiedRequest::Message { channel, message }) => {
                session.message_log.push(MessageLogItem {
                    channel_id: channel,
                    message,
                });
            }
            Ok(ClassifiedRequest::Unknown) => {}
            Err(error) => {
                warn!(path = %path, error = %error, "Rejecting malformed Slack API call");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string());
            }
        }
    }

    // Clone the override out of the registry before awaiting it; no lock
    // is held while user code runs.
    let override_fn = state
        .intercepts
        .get(&path)
        .map(|entry| Arc::clone(entry.value()));

    let body = match override_fn {
        Some(produce) => {
            trace!(path = %path, "Applying registered response override");
            merge_envelope(produce().await)
        }
        None => success_envelope(),
    };

    (
        StatusCode::OK,
        [(MOCK_MARKER_HEADER, MOCK_MARKER_VALUE)],
        Json(body),
    )
        .into_response()
}

/// Slack's generic success envelope
fn success_envelope() -> Value {
    json!({ "ok": true, "response_metadata": {} })
}

/// Shallow-merge an override's fields over the success envelope
fn merge_envelope(overlay: Value) -> Value {
    let mut body = success_envelope();
    if let (Value::Object(base), Value::Object(overlay)) = (&mut body, overlay) {
        for (key, value) in overlay {
            base.insert(key, value);
        }
    }
    body
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(MOCK_MARKER_HEADER, MOCK_MARKER_VALUE)],
        Json(json!({ "ok": false, "error": message })),
    )
        .into_response()
}
