//! # Logging Configuration
//!
//! Installs the global tracing subscriber. `RUST_LOG` takes precedence over
//! `--log-level` so individual modules can be turned up without a redeploy.

use crate::constants::DEFAULT_LOG_LEVEL;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level applied to this crate (error, warn, info, debug, trace)
    pub level: String,
    /// Emit one JSON object per event
    pub as_json: bool,
    /// Colour output when stderr is a terminal
    pub color: bool,
    /// Colour output unconditionally
    pub force_color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            as_json: false,
            color: false,
            force_color: false,
        }
    }
}

impl LogConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[must_use]
    pub fn default_directive(&self) -> String {
        format!("proxy_kubeconfig_generator={}", self.level.to_lowercase())
    }

    #[must_use]
    pub fn use_ansi(&self) -> bool {
        self.force_color || (self.color && std::io::stderr().is_terminal())
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init(&self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(self.use_ansi());

        if self.as_json {
            builder
                .json()
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install JSON subscriber: {e}"))
        } else {
            builder
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install subscriber: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_lowercases_level() {
        let config = LogConfig {
            level: "DEBUG".to_string(),
            ..LogConfig::default()
        };
        assert_eq!(config.default_directive(), "proxy_kubeconfig_generator=debug");
    }

    #[test]
    fn test_force_color_wins() {
        let config = LogConfig {
            force_color: true,
            ..LogConfig::default()
        };
        assert!(config.use_ansi());
    }

    #[test]
    fn test_color_disabled_by_default() {
        assert!(!LogConfig::default().use_ansi());
    }
}
