//! # Kubernetes Access
//!
//! The generator only ever talks to the cluster through [`ClusterApi`], which
//! covers exactly the calls a pass makes. [`KubeClusterApi`] implements it on
//! top of a `kube::Client`.

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};

mod client;
mod operation;

pub use client::{build_client, KubeClusterApi};
pub use operation::OperationArgs;

/// Cluster operations needed to generate and persist tenant kubeconfigs
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Names of the namespaces matching a label selector
    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<String>>;

    /// Get a service account, `None` if it does not exist
    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>>;

    /// Get a secret, `None` if it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    /// Create a secret in `namespace`
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret>;

    /// Replace an existing secret in `namespace`
    async fn update_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret>;
}
