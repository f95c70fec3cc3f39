//! Proxy Kubeconfig Generator Library
//!
//! Periodically mirrors a service account token and the CA certificate of a
//! Kubernetes API proxy into a kubeconfig, stored as a secret in every target
//! namespace. Tenants mount that secret to talk to the cluster through the
//! proxy with least-privilege credentials.
//!
//! ## Quick Start
//!
//! ```rust
//! use proxy_kubeconfig_generator::prelude::*;
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
pub mod k8s;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod server;
