//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use proxy_kubeconfig_generator::prelude::*;
//! ```

// Configuration
pub use crate::config::{GeneratorConfig, LogConfig, NamespaceSelector, ServerConfig};

// Cluster access seam, implemented by `KubeClusterApi` and by test doubles
pub use crate::k8s::{ClusterApi, KubeClusterApi, OperationArgs};

// Generation pipeline
pub use crate::generator::{
    generate_for_namespace, KubeConfig, ReconcileAction, ReconcileOutcome, SourceSecretCache,
};

// Run loop
pub use crate::runtime::{run, run_once, PassReport};

// Errors
pub use crate::error::{ConfigError, GeneratorError};
