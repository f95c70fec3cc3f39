//! Common test utilities
//!
//! [`FakeClusterApi`] is an in-memory cluster: namespaces with labels, service
//! accounts and secrets, with call counters and failure injection.

#![allow(dead_code, reason = "Not every test binary uses every helper")]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ObjectReference, Secret, ServiceAccount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use proxy_kubeconfig_generator::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SERVICE_ACCOUNT: &str = "tenant";
pub const TOKEN: &str = "eyJhbGciOiJSUzI1NiJ9.tenant";
pub const PROXY_NAMESPACE: &str = "proxy-system";
pub const PROXY_TLS_SECRET: &str = "proxy-tls";
pub const PROXY_CA: &[u8] = b"-----BEGIN CERTIFICATE-----\nproxy\n-----END CERTIFICATE-----\n";
pub const SERVER: &str = "https://kube-proxy.proxy-system.svc:9001";
pub const DESTINATION_SECRET: &str = "tenant-kubeconfig";
pub const REVISION_LABEL: &str = "proxy-kubeconfig-generator/source-revision";

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct State {
    namespaces: BTreeMap<String, BTreeMap<String, String>>,
    service_accounts: BTreeMap<Key, ServiceAccount>,
    secrets: BTreeMap<Key, Secret>,
    resource_version: u64,
    creates: usize,
    updates: usize,
    secret_reads: BTreeMap<Key, usize>,
    namespace_lists: usize,
    fail_namespace_list: bool,
    failing_secret_reads: BTreeSet<Key>,
    failing_writes: BTreeSet<String>,
}

impl State {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }
}

#[derive(Default)]
pub struct FakeClusterApi {
    state: Mutex<State>,
}

impl FakeClusterApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_namespace(&self, name: &str, labels: &[(&str, &str)]) {
        self.state().namespaces.insert(
            name.to_string(),
            labels
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
    }

    /// Service account referencing a `<name>-token` secret holding `token`
    pub fn add_service_account(&self, namespace: &str, name: &str, token: &str) {
        let secret_name = format!("{name}-token");
        self.add_service_account_referencing(namespace, name, &[&secret_name]);
        self.put_secret(
            namespace,
            &secret_name,
            &[("token", token.as_bytes()), ("ca.crt", b"cluster-ca")],
        );
    }

    pub fn add_service_account_referencing(&self, namespace: &str, name: &str, secrets: &[&str]) {
        let service_account = ServiceAccount {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            secrets: Some(
                secrets
                    .iter()
                    .map(|secret| ObjectReference {
                        name: Some((*secret).to_string()),
                        ..ObjectReference::default()
                    })
                    .collect(),
            ),
            ..ServiceAccount::default()
        };
        self.state()
            .service_accounts
            .insert(key(namespace, name), service_account);
    }

    pub fn put_secret(&self, namespace: &str, name: &str, data: &[(&str, &[u8])]) {
        let mut state = self.state();
        let resource_version = state.next_resource_version();
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                resource_version: Some(resource_version),
                generation: Some(1),
                ..ObjectMeta::default()
            },
            data: Some(
                data.iter()
                    .map(|(k, v)| ((*k).to_string(), ByteString(v.to_vec())))
                    .collect(),
            ),
            ..Secret::default()
        };
        state.secrets.insert(key(namespace, name), secret);
    }

    /// Edit a stored secret in place, bumping its resource version
    pub fn modify_secret(&self, namespace: &str, name: &str, edit: impl FnOnce(&mut Secret)) {
        let mut state = self.state();
        let resource_version = state.next_resource_version();
        let secret = state
            .secrets
            .get_mut(&key(namespace, name))
            .unwrap_or_else(|| panic!("no secret {namespace}/{name}"));
        edit(secret);
        secret.metadata.resource_version = Some(resource_version);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.state().secrets.get(&key(namespace, name)).cloned()
    }

    pub fn creates(&self) -> usize {
        self.state().creates
    }

    pub fn updates(&self) -> usize {
        self.state().updates
    }

    pub fn writes(&self) -> usize {
        let state = self.state();
        state.creates + state.updates
    }

    pub fn secret_reads(&self, namespace: &str, name: &str) -> usize {
        self.state()
            .secret_reads
            .get(&key(namespace, name))
            .copied()
            .unwrap_or_default()
    }

    pub fn namespace_lists(&self) -> usize {
        self.state().namespace_lists
    }

    pub fn fail_namespace_list(&self) {
        self.state().fail_namespace_list = true;
    }

    pub fn fail_secret_reads(&self, namespace: &str, name: &str) {
        self.state().failing_secret_reads.insert(key(namespace, name));
    }

    /// Reject every create and update of secrets in `namespace`
    pub fn fail_writes(&self, namespace: &str) {
        self.state().failing_writes.insert(namespace.to_string());
    }
}

/// Equality-based selector: `k=v`, `k==v`, `k!=v`, `k`, `!k`, terms joined by `,`
fn matches_selector(labels: &BTreeMap<String, String>, selector: &str) -> bool {
    selector.split(',').map(str::trim).all(|term| {
        if let Some((k, v)) = term.split_once("!=") {
            labels.get(k.trim()).map(String::as_str) != Some(v.trim())
        } else if let Some((k, v)) = term.split_once("==").or_else(|| term.split_once('=')) {
            labels.get(k.trim()).map(String::as_str) == Some(v.trim())
        } else if let Some(k) = term.strip_prefix('!') {
            !labels.contains_key(k.trim())
        } else {
            labels.contains_key(term)
        }
    })
}

#[async_trait]
impl ClusterApi for FakeClusterApi {
    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<String>> {
        let mut state = self.state();
        state.namespace_lists += 1;
        if state.fail_namespace_list {
            bail!("namespaces is forbidden");
        }
        Ok(state
            .namespaces
            .iter()
            .filter(|(_, labels)| matches_selector(labels, label_selector))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>> {
        Ok(self.state().service_accounts.get(&key(namespace, name)).cloned())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let mut state = self.state();
        let k = key(namespace, name);
        *state.secret_reads.entry(k.clone()).or_default() += 1;
        if state.failing_secret_reads.contains(&k) {
            bail!("secrets \"{name}\" is forbidden");
        }
        Ok(state.secrets.get(&k).cloned())
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        let mut state = self.state();
        let name = secret
            .metadata
            .name
            .clone()
            .ok_or_else(|| anyhow!("secret has no name"))?;
        if state.failing_writes.contains(namespace) {
            bail!("secrets is forbidden: cannot create in namespace \"{namespace}\"");
        }
        let k = key(namespace, &name);
        if state.secrets.contains_key(&k) {
            bail!("secrets \"{name}\" already exists");
        }
        let mut stored = secret.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        stored.metadata.resource_version = Some(state.next_resource_version());
        state.secrets.insert(k, stored.clone());
        state.creates += 1;
        Ok(stored)
    }

    async fn update_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        let mut state = self.state();
        let name = secret
            .metadata
            .name
            .clone()
            .ok_or_else(|| anyhow!("secret has no name"))?;
        if state.failing_writes.contains(namespace) {
            bail!("secrets \"{name}\" is forbidden: cannot update in namespace \"{namespace}\"");
        }
        let k = key(namespace, &name);
        if !state.secrets.contains_key(&k) {
            bail!("secrets \"{name}\" not found");
        }
        let mut stored = secret.clone();
        stored.metadata.resource_version = Some(state.next_resource_version());
        state.secrets.insert(k, stored.clone());
        state.updates += 1;
        Ok(stored)
    }
}

/// Valid configuration targeting the fixed namespace `team-a`
pub fn config() -> GeneratorConfig {
    GeneratorConfig {
        service_account_name: SERVICE_ACCOUNT.to_string(),
        namespace: "team-a".to_string(),
        server: SERVER.to_string(),
        server_tls_secret_namespace: PROXY_NAMESPACE.to_string(),
        server_tls_secret_name: PROXY_TLS_SECRET.to_string(),
        iteration_interval: Duration::from_millis(10),
        ..GeneratorConfig::default()
    }
}

/// Cluster holding the proxy TLS secret and a tenant service account in `team-a`
pub fn cluster() -> Arc<FakeClusterApi> {
    let cluster = FakeClusterApi::new();
    cluster.put_secret(
        PROXY_NAMESPACE,
        PROXY_TLS_SECRET,
        &[("ca.crt", PROXY_CA), ("tls.crt", b"cert"), ("tls.key", b"key")],
    );
    cluster.add_namespace("team-a", &[]);
    cluster.add_service_account("team-a", SERVICE_ACCOUNT, TOKEN);
    cluster
}

pub fn args(config: GeneratorConfig, cluster: &Arc<FakeClusterApi>) -> OperationArgs {
    let api: Arc<dyn ClusterApi> = Arc::clone(cluster) as Arc<dyn ClusterApi>;
    OperationArgs::new(Arc::new(config), api)
}

/// Revision label value of a stored secret
pub fn revision_label(secret: &Secret) -> Option<String> {
    secret
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(REVISION_LABEL).cloned())
}

/// Revision the generator is expected to record for the proxy TLS secret
pub fn source_revision(cluster: &FakeClusterApi) -> String {
    let source = cluster
        .secret(PROXY_NAMESPACE, PROXY_TLS_SECRET)
        .expect("proxy TLS secret");
    format!(
        "{}_{}",
        source.metadata.resource_version.unwrap_or_default(),
        source.metadata.generation.unwrap_or_default()
    )
}
