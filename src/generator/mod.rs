//! # Generator
//!
//! One pass produces, for every target namespace, a kubeconfig made of the
//! namespace's service account token and the proxy CA, and persists it into the
//! namespace's destination secret.
//!
//! ```text
//! namespaces::resolve_namespaces
//!   └─ per namespace: generate_for_namespace
//!        ├─ credentials::read_service_account_token
//!        ├─ SourceSecretCache::get (read once per pass)
//!        ├─ KubeConfig::build
//!        └─ reconcile::reconcile_secret
//! ```

pub mod credentials;
pub mod kubeconfig;
pub mod namespaces;
pub mod reconcile;

pub use credentials::{ServiceAccountToken, SourceRevision, SourceSecret};
pub use kubeconfig::KubeConfig;
pub use namespaces::{find_namespaces, resolve_namespaces};
pub use reconcile::{decide, reconcile_secret, ReconcileAction, ReconcileOutcome};

use crate::error::GeneratorError;
use crate::k8s::OperationArgs;
use tracing::debug;

/// Source TLS secret read at most once per pass
///
/// A failed read is remembered too, so every namespace of the pass reports it
/// without hitting the API again.
#[derive(Debug, Default)]
pub struct SourceSecretCache {
    slot: Option<Result<SourceSecret, String>>,
}

impl SourceSecretCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The source secret of this pass, reading it on first use
    ///
    /// # Errors
    ///
    /// [`GeneratorError::SourceSecretUnavailable`] if the read failed, now or
    /// earlier in the pass.
    pub async fn get(&mut self, args: &OperationArgs) -> Result<&SourceSecret, GeneratorError> {
        let config = &args.config;
        let state = match self.slot.take() {
            Some(state) => state,
            None => credentials::read_source_secret(
                args,
                &config.server_tls_secret_namespace,
                &config.server_tls_secret_name,
            )
            .await
            .map_err(|e| e.to_string()),
        };

        match self.slot.insert(state) {
            Ok(source) => Ok(source),
            Err(reason) => Err(GeneratorError::SourceSecretUnavailable {
                namespace: config.server_tls_secret_namespace.clone(),
                name: config.server_tls_secret_name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Generate and persist the kubeconfig of one target namespace
///
/// # Errors
///
/// Any [`GeneratorError`] met on the way; it only concerns `namespace`.
pub async fn generate_for_namespace(
    args: &OperationArgs,
    namespace: &str,
    source_cache: &mut SourceSecretCache,
) -> Result<ReconcileOutcome, GeneratorError> {
    let config = &args.config;

    let token =
        credentials::read_service_account_token(args, namespace, &config.service_account_name)
            .await?;

    let source = source_cache.get(args).await?;
    let ca_certificate = credentials::read_ca_field(source, &config.server_tls_secret_ca_key)?;

    let kubeconfig = KubeConfig::build(
        &token,
        &ca_certificate,
        &config.server,
        &config.server_tls_secret_namespace,
    )?;
    debug!(namespace, source_revision = %source.revision, "Built tenant kubeconfig");

    reconcile_secret(args, namespace, &kubeconfig, source).await
}
