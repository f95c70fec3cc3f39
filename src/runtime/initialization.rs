//! # Initialization
//!
//! Process startup: rustls setup, metrics registration, HTTP server startup,
//! shutdown signal handling and Kubernetes client setup.

use crate::config::{GeneratorConfig, ServerConfig};
use crate::k8s::{build_client, KubeClusterApi, OperationArgs};
use crate::observability::metrics;
use crate::server::{start_server, ServerState};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything the run loop needs once startup succeeded
pub struct InitializationResult {
    pub args: OperationArgs,
    pub server_state: Arc<ServerState>,
    pub server_handle: JoinHandle<()>,
    /// Cancelled on SIGINT/SIGTERM
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Initialize the generator runtime
///
/// # Errors
///
/// Fails when metrics cannot be registered, the HTTP server does not come up
/// in time, or no Kubernetes client can be built.
pub async fn initialize(
    config: GeneratorConfig,
    server_config: ServerConfig,
) -> Result<InitializationResult> {
    // kube's rustls-tls feature needs a process-wide provider before the first connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    metrics::register_metrics().context("Failed registering metrics")?;

    let shutdown = CancellationToken::new();
    let server_state = ServerState::new();

    let server_handle = {
        let state = Arc::clone(&server_state);
        let token = shutdown.clone();
        let server_config = server_config.clone();
        tokio::spawn(async move {
            if let Err(e) = start_server(server_config, state, token).await {
                error!(reason = %format!("{e:#}"), "HTTP server error");
            }
        })
    };

    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    spawn_shutdown_listener(shutdown.clone(), Arc::clone(&server_state));

    let client = build_client().await?;
    let args = OperationArgs::new(Arc::new(config), Arc::new(KubeClusterApi::new(client)));

    info!("Generator initialized, starting run loop");

    Ok(InitializationResult {
        args,
        server_state,
        server_handle,
        shutdown,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let poll_interval = server_config.poll_interval();
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Cancel `shutdown` on SIGINT or SIGTERM and mark the server as not ready
pub fn spawn_shutdown_listener(
    shutdown: CancellationToken,
    server_state: Arc<ServerState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal, finishing the current pass");
        server_state.set_ready(false);
        shutdown.cancel();
    })
}

/// Mark the server as not ready, stop it and wait for its task to exit
pub async fn stop_server(
    server_state: &ServerState,
    shutdown: &CancellationToken,
    server_handle: JoinHandle<()>,
) {
    server_state.set_ready(false);
    shutdown.cancel();
    if let Err(e) = server_handle.await {
        error!(reason = %e, "HTTP server task did not shut down cleanly");
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!(
                reason = %e,
                "Failed installing SIGTERM handler, only SIGINT will stop the generator"
            );
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(reason = %e, "Failed waiting for SIGINT");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(reason = %e, "Failed waiting for SIGINT");
    }
}
