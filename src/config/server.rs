//! # Server Configuration
//!
//! Bind address and URI paths of the metrics and health server.

use crate::constants::{
    DEFAULT_METRICS_BIND_HOST_PORT, DEFAULT_SERVER_POLL_INTERVAL_MS,
    DEFAULT_SERVER_STARTUP_TIMEOUT_SECS, DEFAULT_URI_PATH_HEALTH, DEFAULT_URI_PATH_METRICS,
};
use crate::error::ConfigError;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` to bind; an empty host binds all interfaces
    pub bind_host_port: String,
    /// Path answering liveness probes
    pub uri_path_health: String,
    /// Path serving Prometheus metrics
    pub uri_path_metrics: String,
    /// How long startup waits for the server to bind
    pub startup_timeout_secs: u64,
    /// Readiness poll interval during startup
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host_port: DEFAULT_METRICS_BIND_HOST_PORT.to_string(),
            uri_path_health: DEFAULT_URI_PATH_HEALTH.to_string(),
            uri_path_metrics: DEFAULT_URI_PATH_METRICS.to_string(),
            startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl ServerConfig {
    /// Address suitable for `TcpListener::bind`
    ///
    /// `":10000"` becomes `"0.0.0.0:10000"`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        if self.bind_host_port.starts_with(':') {
            format!("0.0.0.0{}", self.bind_host_port)
        } else {
            self.bind_host_port.clone()
        }
    }

    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] when a path does not start with `/` or both
    /// endpoints share a path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_host_port.is_empty() {
            return Err(ConfigError::Missing("metrics server bind host port"));
        }
        for (field, path) in [
            ("health URI path", &self.uri_path_health),
            ("metrics URI path", &self.uri_path_metrics),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("'{path}' must start with '/'"),
                });
            }
        }
        if self.uri_path_health == self.uri_path_metrics {
            return Err(ConfigError::Invalid {
                field: "health URI path",
                reason: "must differ from the metrics URI path".to_string(),
            });
        }
        Ok(())
    }
}
