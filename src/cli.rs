//! # Command Line
//!
//! Flags of the generator binary. Every flag can also be set through the
//! environment variable named next to it in `--help`.
//!
//! ```bash
//! proxy-kubeconfig-generator \
//!     --serviceaccount tenant \
//!     --namespace-label-selector tenant=acme \
//!     --server https://kube-proxy.proxy-system.svc:9001 \
//!     --server-tls-secret-namespace proxy-system \
//!     --server-tls-secret-name proxy-tls
//! ```

use crate::config::{parse_duration, GeneratorConfig, LogConfig, NamespaceSelector, ServerConfig};
use crate::constants::{
    DEFAULT_ITERATION_INTERVAL, DEFAULT_KUBECONFIG_SECRET_KEY, DEFAULT_LOG_LEVEL,
    DEFAULT_METRICS_BIND_HOST_PORT, DEFAULT_NAMESPACE, DEFAULT_SERVER_POLL_INTERVAL_MS,
    DEFAULT_SERVER_STARTUP_TIMEOUT_SECS, DEFAULT_SOURCE_SECRET_REVISION_LABEL,
    DEFAULT_TLS_SECRET_CA_KEY, DEFAULT_URI_PATH_HEALTH, DEFAULT_URI_PATH_METRICS, LOG_LEVELS,
};
use clap::Parser;
use std::time::Duration;

/// Generate kubeconfig secrets for tenants of a Kubernetes API proxy
#[derive(Debug, Parser)]
#[command(name = "proxy-kubeconfig-generator", version, about, long_about = None)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Each bool is an independent command line switch"
)]
pub struct Cli {
    /// The name of the service account for which to create the kubeconfig
    #[arg(long = "serviceaccount", env = "SERVICE_ACCOUNT", default_value = "")]
    pub service_account: String,

    /// Namespace of the service account and of the generated secret, ignored when
    /// selectors are in use
    #[arg(long, env = "NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Label selector used to discover target namespaces, repeatable; namespaces
    /// matching any selector are used
    #[arg(
        long = "namespace-label-selector",
        env = "NAMESPACE_LABEL_SELECTOR",
        value_delimiter = ';'
    )]
    pub namespace_label_selector: Vec<String>,

    /// The server URL of the kubeconfig where the tenant will connect to
    #[arg(long, env = "SERVER", default_value = "")]
    pub server: String,

    /// The namespace of the server TLS secret
    #[arg(long, env = "SERVER_TLS_SECRET_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub server_tls_secret_namespace: String,

    /// The name of the secret containing the server CA certificate
    #[arg(long, env = "SERVER_TLS_SECRET_NAME", default_value = "")]
    pub server_tls_secret_name: String,

    /// The key of the CA certificate in the server TLS secret
    #[arg(long, env = "SERVER_TLS_SECRET_CA_KEY", default_value = DEFAULT_TLS_SECRET_CA_KEY)]
    pub server_tls_secret_ca_key: String,

    /// The key of the kubeconfig in the generated secret
    #[arg(long, env = "KUBECONFIG_SECRET_KEY", default_value = DEFAULT_KUBECONFIG_SECRET_KEY)]
    pub kubeconfig_secret_key: String,

    /// Label recording the source secret revision on generated secrets
    #[arg(
        long,
        env = "SOURCE_SECRET_REVISION_LABEL",
        default_value = DEFAULT_SOURCE_SECRET_REVISION_LABEL
    )]
    pub source_secret_revision_label: String,

    /// Time between passes, e.g. 500ms, 10s, 1m
    #[arg(
        long,
        env = "ITERATION_INTERVAL",
        default_value = DEFAULT_ITERATION_INTERVAL,
        value_parser = parse_interval
    )]
    pub iteration_interval: Duration,

    /// Never update an existing generated secret
    #[arg(long, env = "DISALLOW_UPDATES")]
    pub disallow_updates: bool,

    /// Log what would be created or updated without writing anything
    #[arg(long, env = "REPORT_ONLY")]
    pub report_only: bool,

    /// Log level
    #[arg(
        long,
        env = "LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL,
        value_parser = LOG_LEVELS,
        ignore_case = true
    )]
    pub log_level: String,

    /// Log as JSON
    #[arg(long, env = "LOG_AS_JSON")]
    pub log_as_json: bool,

    /// Colorize log output when writing to a terminal
    #[arg(long, env = "LOG_COLOR")]
    pub log_color: bool,

    /// Colorize log output even when not writing to a terminal
    #[arg(long, env = "LOG_FORCE_COLOR")]
    pub log_force_color: bool,

    /// Metrics and health server bind address
    #[arg(
        long,
        env = "METRICS_SERVER_BIND_HOST_PORT",
        default_value = DEFAULT_METRICS_BIND_HOST_PORT
    )]
    pub metrics_server_bind_host_port: String,

    /// Health check URI path
    #[arg(long, env = "URI_PATH_HEALTH", default_value = DEFAULT_URI_PATH_HEALTH)]
    pub uri_path_health: String,

    /// Metrics URI path
    #[arg(long, env = "URI_PATH_METRICS", default_value = DEFAULT_URI_PATH_METRICS)]
    pub uri_path_metrics: String,

    /// Seconds to wait for the metrics server to bind at startup
    #[arg(
        long,
        env = "SERVER_STARTUP_TIMEOUT_SECS",
        default_value_t = DEFAULT_SERVER_STARTUP_TIMEOUT_SECS
    )]
    pub server_startup_timeout_secs: u64,

    /// Milliseconds between metrics server readiness checks at startup
    #[arg(
        long,
        env = "SERVER_POLL_INTERVAL_MS",
        default_value_t = DEFAULT_SERVER_POLL_INTERVAL_MS
    )]
    pub server_poll_interval_ms: u64,
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}

impl Cli {
    #[must_use]
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            service_account_name: self.service_account.clone(),
            namespace: self.namespace.clone(),
            namespace_selector: NamespaceSelector::new(
                self.namespace_label_selector.iter().cloned(),
            ),
            server: self.server.clone(),
            server_tls_secret_namespace: self.server_tls_secret_namespace.clone(),
            server_tls_secret_name: self.server_tls_secret_name.clone(),
            server_tls_secret_ca_key: self.server_tls_secret_ca_key.clone(),
            kubeconfig_secret_key: self.kubeconfig_secret_key.clone(),
            source_secret_revision_label: self.source_secret_revision_label.clone(),
            iteration_interval: self.iteration_interval,
            disallow_updates: self.disallow_updates,
            report_only: self.report_only,
        }
    }

    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_host_port: self.metrics_server_bind_host_port.clone(),
            uri_path_health: self.uri_path_health.clone(),
            uri_path_metrics: self.uri_path_metrics.clone(),
            startup_timeout_secs: self.server_startup_timeout_secs,
            poll_interval_ms: self.server_poll_interval_ms,
        }
    }

    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            as_json: self.log_as_json,
            color: self.log_color,
            force_color: self.log_force_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["proxy-kubeconfig-generator"]).unwrap();
        let config = cli.generator_config();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.server_tls_secret_namespace, "default");
        assert_eq!(config.server_tls_secret_ca_key, "ca.crt");
        assert_eq!(config.kubeconfig_secret_key, "kubeconfig");
        assert_eq!(config.iteration_interval, Duration::from_secs(10));
        assert!(!config.uses_namespace_selector());
        assert!(!config.disallow_updates);
        assert!(!config.report_only);

        let server = cli.server_config();
        assert_eq!(server.bind_address(), "0.0.0.0:10000");
        assert_eq!(server.uri_path_health, "/health");
        assert_eq!(server.uri_path_metrics, "/metrics");
    }

    #[test]
    fn test_full_command_line() {
        let cli = Cli::try_parse_from([
            "proxy-kubeconfig-generator",
            "--serviceaccount",
            "tenant",
            "--namespace-label-selector",
            "tenant=acme",
            "--namespace-label-selector",
            "env=dev,team=x",
            "--server",
            "https://proxy:9001",
            "--server-tls-secret-namespace",
            "proxy-system",
            "--server-tls-secret-name",
            "proxy-tls",
            "--iteration-interval",
            "500ms",
            "--report-only",
            "--log-as-json",
        ])
        .unwrap();

        let config = cli.generator_config();
        assert_eq!(config.service_account_name, "tenant");
        assert_eq!(
            config.namespace_selector.expressions(),
            ["tenant=acme", "env=dev,team=x"]
        );
        assert_eq!(config.iteration_interval, Duration::from_millis(500));
        assert!(config.report_only);
        assert!(cli.log_config().as_json);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_interval() {
        assert!(
            Cli::try_parse_from(["proxy-kubeconfig-generator", "--iteration-interval", "10x"])
                .is_err()
        );
    }

    #[test]
    fn test_log_level_is_restricted() {
        let err = Cli::try_parse_from(["proxy-kubeconfig-generator", "--log-level", "verbose"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);

        let cli = Cli::try_parse_from(["proxy-kubeconfig-generator", "--log-level", "DEBUG"])
            .unwrap();
        assert_eq!(cli.log_config().default_directive(), "proxy_kubeconfig_generator=debug");
    }
}
