//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Serve pages and static files
//! - Forward POST bodies to the collector and redirect
//! - Stop accepting on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::error::FrontDoorError;
use crate::http::forward::Forwarder;
use crate::http::pages::{StaticFiles, INDEX_PAGE, MESSAGE_PAGE};
use crate::lifecycle::shutdown;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub files: StaticFiles,
    pub forwarder: Arc<Forwarder>,
    pub max_body_bytes: usize,
}

/// The front door HTTP server.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server forwarding submissions through `forwarder`.
    pub fn new(config: &RelayConfig, forwarder: Forwarder) -> Self {
        let state = AppState {
            files: StaticFiles::new(&config.front_door.static_dir),
            forwarder: Arc::new(forwarder),
            max_body_bytes: config.collector.max_datagram_bytes,
        };
        let timeout = Duration::from_secs(config.front_door.request_timeout_secs);
        Self {
            router: Self::build_router(state, timeout),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, timeout: Duration) -> Router {
        Router::new()
            .route("/", get(index).post(submit))
            .route("/message", get(message).post(submit))
            .route("/{*path}", get(static_file).post(submit))
            .with_state(state)
            .layer(middleware::from_fn(record_metrics))
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Accept connections on `listener` until shutdown is triggered.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Front door listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("Front door stopped");
        Ok(())
    }
}

async fn index(State(state): State<AppState>) -> Result<Response, FrontDoorError> {
    state.files.page(INDEX_PAGE, StatusCode::OK).await
}

async fn message(State(state): State<AppState>) -> Result<Response, FrontDoorError> {
    state.files.page(MESSAGE_PAGE, StatusCode::OK).await
}

async fn static_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    state.files.file(&path).await
}

/// Forward the raw body as one datagram, then redirect home.
///
/// A failed send is logged; the client is redirected either way.
async fn submit(State(state): State<AppState>, request: Request) -> Result<Response, FrontDoorError> {
    let request_id = request_id(request.headers());
    let declared = content_length(request.headers())?;
    if declared > state.max_body_bytes {
        return Err(FrontDoorError::PayloadTooLarge {
            len: declared,
            max: state.max_body_bytes,
        });
    }

    let body = axum::body::to_bytes(request.into_body(), state.max_body_bytes)
        .await
        .map_err(|e| FrontDoorError::Body(e.to_string()))?;

    match state.forwarder.forward(&body).await {
        Ok(()) => tracing::debug!(
            request_id = %request_id,
            bytes = body.len(),
            collector = %state.forwarder.target(),
            "Submission forwarded"
        ),
        Err(e) => tracing::warn!(
            request_id = %request_id,
            bytes = body.len(),
            collector = %state.forwarder.target(),
            error = %e,
            "Failed to forward submission"
        ),
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, "/")]).into_response())
}

fn content_length(headers: &HeaderMap) -> Result<usize, FrontDoorError> {
    let value = headers
        .get(header::CONTENT_LENGTH)
        .ok_or(FrontDoorError::MissingContentLength)?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or(FrontDoorError::InvalidContentLength)
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

async fn record_metrics(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};
    use tokio::net::UdpSocket;
    use tower::ServiceExt;

    async fn server_with_sink(dir: &tempfile::TempDir, max: usize) -> (Router, UdpSocket) {
        std::fs::write(dir.path().join(INDEX_PAGE), "<h1>home</h1>").unwrap();
        let sink = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut config = RelayConfig::default();
        config.front_door.static_dir = dir.path().display().to_string();
        config.collector.max_datagram_bytes = max;
        let forwarder = Forwarder::bind(sink.local_addr().unwrap()).await.unwrap();
        (HttpServer::new(&config, forwarder).router(), sink)
    }

    #[test]
    fn test_content_length_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            content_length(&headers),
            Err(FrontDoorError::MissingContentLength)
        ));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("abc"));
        assert!(matches!(
            content_length(&headers),
            Err(FrontDoorError::InvalidContentLength)
        ));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        assert_eq!(content_length(&headers).unwrap(), 42);
    }

    #[tokio::test]
    async fn test_index_has_request_id() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _sink) = server_with_sink(&dir, 1024).await;

        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_post_forwards_and_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let (router, sink) = server_with_sink(&dir, 1024).await;

        let response = router
            .oneshot(
                Request::post("/message")
                    .header(header::CONTENT_LENGTH, "15")
                    .body(Body::from("name=Ann&age=30"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let mut buf = [0u8; 64];
        let (len, _) = sink.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"name=Ann&age=30");
    }

    #[tokio::test]
    async fn test_post_without_length_is_411() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _sink) = server_with_sink(&dir, 1024).await;

        let response = router
            .oneshot(Request::post("/").body(Body::from("a=1")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::LENGTH_REQUIRED);
    }

    #[tokio::test]
    async fn test_post_over_limit_is_413() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _sink) = server_with_sink(&dir, 4).await;

        let response = router
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_LENGTH, "5")
                    .body(Body::from("a=123"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
