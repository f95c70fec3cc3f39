//! `kube::Client` backed [`ClusterApi`].

use super::ClusterApi;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret, ServiceAccount};
use kube::api::{Api, ListParams, PostParams};
use kube::{Client, Config};
use tracing::debug;

/// Build a client from the local kubeconfig, falling back to the in-cluster environment
///
/// # Errors
///
/// Fails when neither a kubeconfig nor an in-cluster service account is available.
pub async fn build_client() -> Result<Client> {
    let config = Config::infer()
        .await
        .context("Failed building client configuration")?;
    debug!(cluster_url = %config.cluster_url, "Inferred Kubernetes client configuration");
    Client::try_from(config).context("Failed building new Kubernetes client")
}

#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
}

impl std::fmt::Debug for KubeClusterApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterApi").finish_non_exhaustive()
    }
}

impl KubeClusterApi {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<String>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces
            .list(&ListParams::default().labels(label_selector))
            .await
            .with_context(|| format!("listing namespaces with selector '{label_selector}'"))?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|namespace| namespace.metadata.name)
            .collect())
    }

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>> {
        let service_accounts: Api<ServiceAccount> =
            Api::namespaced(self.client.clone(), namespace);
        service_accounts
            .get_opt(name)
            .await
            .with_context(|| format!("getting service account '{namespace}/{name}'"))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        self.secrets(namespace)
            .get_opt(name)
            .await
            .with_context(|| format!("getting secret '{namespace}/{name}'"))
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        self.secrets(namespace)
            .create(&PostParams::default(), secret)
            .await
            .with_context(|| format!("creating secret in namespace '{namespace}'"))
    }

    async fn update_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        let name = secret
            .metadata
            .name
            .as_deref()
            .context("secret to update has no name")?;
        self.secrets(namespace)
            .replace(name, &PostParams::default(), secret)
            .await
            .with_context(|| format!("updating secret '{namespace}/{name}'"))
    }
}
