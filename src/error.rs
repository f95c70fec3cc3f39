//! # Errors
//!
//! Error types shared by the generator.
//!
//! - [`ConfigError`] is fatal and only produced at startup.
//! - [`GeneratorError`] is scoped to a single target namespace: it is logged,
//!   counted, and the pass moves on to the next namespace.

use thiserror::Error;

/// Invalid startup configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failure while generating or persisting the kubeconfig for one namespace
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("no '{field}' key in secret '{namespace}/{secret}'")]
    MissingField {
        field: String,
        namespace: String,
        secret: String,
    },

    #[error("kubeconfig did not validate: {0}")]
    Validation(String),

    #[error("failed serializing kubeconfig: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("source secret '{namespace}/{name}' unavailable this pass: {reason}")]
    SourceSecretUnavailable {
        namespace: String,
        name: String,
        reason: String,
    },

    #[error("{operation} failed: {source}")]
    Api {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl GeneratorError {
    pub(crate) fn api(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Api { operation, source }
    }
}
