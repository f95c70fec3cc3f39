//! # HTTP Server
//!
//! HTTP server for Prometheus metrics and the health probe.
//!
//! Both paths are configurable:
//! - metrics (default `/metrics`): Prometheus text format
//! - health (default `/health`): 200 once the server is bound, 503 after shutdown starts

use crate::config::ServerConfig;
use crate::observability::metrics;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Default)]
pub struct ServerState {
    pub is_ready: AtomicBool,
}

impl ServerState {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::Relaxed)
    }
}

/// Router serving the metrics and health paths from `config`
pub fn router(config: &ServerConfig, state: Arc<ServerState>) -> Router {
    Router::new()
        .route(&config.uri_path_metrics, get(metrics_handler))
        .route(&config.uri_path_health, get(health_handler))
        .with_state(state)
}

/// Bind and serve until `shutdown` is cancelled
///
/// Marks `state` ready once the listener is bound.
///
/// # Errors
///
/// Fails when the address cannot be bound or serving fails.
pub async fn start_server(
    config: ServerConfig,
    state: Arc<ServerState>,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = router(&config, Arc::clone(&state));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed binding HTTP server to {addr}"))?;

    info!(
        address = %addr,
        metrics_path = %config.uri_path_metrics,
        health_path = %config.uri_path_health,
        "HTTP server listening"
    );
    state.set_ready(true);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = metrics::gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(reason = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
}

async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn config() -> ServerConfig {
        ServerConfig {
            uri_path_health: "/live".to_string(),
            uri_path_metrics: "/prom".to_string(),
            ..ServerConfig::default()
        }
    }

    async fn status_of(app: Router, path: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_follows_readiness() {
        let state = ServerState::new();
        assert_eq!(
            status_of(router(&config(), Arc::clone(&state)), "/live").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.set_ready(true);
        assert_eq!(
            status_of(router(&config(), state), "/live").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_metrics_on_configured_path() {
        metrics::increment_runs();
        let app = router(&config(), ServerState::new());
        let response = app
            .oneshot(Request::builder().uri("/prom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_default_paths_not_served_when_overridden() {
        let app = router(&config(), ServerState::new());
        assert_eq!(status_of(app, "/metrics").await, StatusCode::NOT_FOUND);
    }
}
