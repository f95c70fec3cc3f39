//! # Proxy Kubeconfig Generator
//!
//! Keeps a `<serviceaccount>-kubeconfig` secret in every target namespace in
//! sync with the service account token and the CA certificate of a Kubernetes
//! API proxy.
//!
//! ## Usage
//!
//! ```bash
//! proxy-kubeconfig-generator \
//!     --serviceaccount tenant \
//!     --server https://kube-proxy.proxy-system.svc:9001 \
//!     --server-tls-secret-namespace proxy-system \
//!     --server-tls-secret-name proxy-tls
//! ```
//!
//! See `--help` for every flag and its environment variable.

use anyhow::{Context, Result};
use clap::Parser;
use proxy_kubeconfig_generator::cli::Cli;
use proxy_kubeconfig_generator::runtime::{initialize, run, stop_server};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    cli.log_config()
        .init()
        .context("Failed initializing logging")?;

    info!(
        build_datetime = env!("BUILD_DATETIME"),
        git_hash = env!("BUILD_GIT_HASH"),
        version = env!("CARGO_PKG_VERSION"),
        "Starting proxy kubeconfig generator"
    );

    let config = cli.generator_config();
    let server_config = cli.server_config();

    if let Err(e) = config.validate() {
        error!(reason = %e, "Invalid configuration");
        std::process::exit(1);
    }
    if let Err(e) = server_config.validate() {
        error!(reason = %e, "Invalid server configuration");
        std::process::exit(1);
    }

    info!(
        service_account = %config.service_account_name,
        namespace = %config.namespace,
        selector = %config.namespace_selector,
        server = %config.server,
        tls_secret_namespace = %config.server_tls_secret_namespace,
        tls_secret_name = %config.server_tls_secret_name,
        "Configuration loaded"
    );

    let init = initialize(config, server_config)
        .await
        .context("Failed initializing generator")?;

    run(init.args, init.shutdown.clone()).await;
    stop_server(&init.server_state, &init.shutdown, init.server_handle).await;

    info!("All done");
    Ok(())
}
