//! Shared test utilities for harbor-policy integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method as HttpMethod, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use harbor_policy::clients::Method;
use harbor_policy::test_util::FakeRegistry;
use harbor_policy::{HttpTransport, RegistryClient, RegistryConfig};
use serde_json::Value;
use tokio::net::TcpListener;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "Harbor12345";

/// `Basic` credentials for USERNAME:PASSWORD.
const EXPECTED_AUTHORIZATION: &str = "Basic YWRtaW46SGFyYm9yMTIzNDU=";
const API_PREFIX: &str = "/api/v2.0";

/// Fake registry served over HTTP on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<FakeRegistry>,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let registry = FakeRegistry::new();
        let router = Router::new()
            .fallback(serve)
            .with_state(Arc::clone(&registry));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            registry,
            shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    pub fn config(&self) -> RegistryConfig {
        RegistryConfig::new(self.base_url()).with_credentials(USERNAME, PASSWORD)
    }

    pub fn client_for(config: &RegistryConfig) -> RegistryClient {
        let transport = HttpTransport::new(config).expect("Failed to build transport");
        RegistryClient::new(Arc::new(transport))
    }

    pub fn client(&self) -> RegistryClient {
        Self::client_for(&self.config())
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn serve(
    State(registry): State<Arc<FakeRegistry>>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == EXPECTED_AUTHORIZATION);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let method = if method == HttpMethod::GET {
        Method::Get
    } else if method == HttpMethod::POST {
        Method::Post
    } else if method == HttpMethod::PUT {
        Method::Put
    } else if method == HttpMethod::DELETE {
        Method::Delete
    } else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    let full = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let Some(path) = full.strip_prefix(API_PREFIX) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let payload: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        }
    };

    let raw = registry.handle(method, path, payload.as_ref());
    let status = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if raw.body.is_empty() {
        status.into_response()
    } else {
        (status, [(header::CONTENT_TYPE, "application/json")], raw.body).into_response()
    }
}
