//! # Constants
//!
//! Shared constants used throughout the generator.
//!
//! Every value here is a default that can be overridden from the command line
//! or the matching environment variable.

/// Namespace used for the target and the source TLS secret when none is given
pub const DEFAULT_NAMESPACE: &str = "default";

/// Key of the CA certificate inside the source TLS secret
pub const DEFAULT_TLS_SECRET_CA_KEY: &str = "ca.crt";

/// Key under which the serialized kubeconfig is stored in the destination secret
pub const DEFAULT_KUBECONFIG_SECRET_KEY: &str = "kubeconfig";

/// Label on the destination secret recording the source revision it was generated from
pub const DEFAULT_SOURCE_SECRET_REVISION_LABEL: &str =
    "proxy-kubeconfig-generator/source-revision";

/// Interval between two reconcile passes
pub const DEFAULT_ITERATION_INTERVAL: &str = "10s";

/// Suffix appended to the service account name to form the destination secret name
pub const TENANT_SECRET_SUFFIX: &str = "-kubeconfig";

/// Field of the service account token secret holding the bearer token
pub const SERVICE_ACCOUNT_TOKEN_KEY: &str = "token";

/// Name of the single cluster and context written into generated kubeconfigs
pub const KUBECONFIG_DEFAULT_NAME: &str = "default";

/// Separator between resource version and generation in the revision fingerprint.
/// Label values only allow alphanumerics, `-`, `_` and `.`.
pub const REVISION_SEPARATOR: char = '_';

/// Default bind address of the metrics and health server
pub const DEFAULT_METRICS_BIND_HOST_PORT: &str = ":10000";

/// Default URI path of the health endpoint
pub const DEFAULT_URI_PATH_HEALTH: &str = "/health";

/// Default URI path of the metrics endpoint
pub const DEFAULT_URI_PATH_METRICS: &str = "/metrics";

/// How long startup waits for the HTTP server to bind
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Readiness poll interval while waiting for the HTTP server
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Accepted `--log-level` values, matched case-insensitively
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
