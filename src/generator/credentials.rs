//! # Credential Reader
//!
//! Reads the tenant service account token and the proxy CA certificate.
//!
//! The token is a bearer credential: it is held in zeroizing memory, redacted
//! from `Debug` output and never logged.

use crate::constants::{REVISION_SEPARATOR, SERVICE_ACCOUNT_TOKEN_KEY};
use crate::error::GeneratorError;
use crate::k8s::OperationArgs;
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error};
use zeroize::Zeroizing;

/// Bearer token of a service account
#[derive(Clone)]
pub struct ServiceAccountToken(Zeroizing<Vec<u8>>);

impl ServiceAccountToken {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ServiceAccountToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceAccountToken(***)")
    }
}

/// Revision of the source secret, `<resourceVersion>_<generation>` when rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRevision {
    pub resource_version: String,
    pub generation: i64,
}

impl SourceRevision {
    #[must_use]
    pub fn of(secret: &Secret) -> Self {
        Self {
            resource_version: secret.metadata.resource_version.clone().unwrap_or_default(),
            generation: secret.metadata.generation.unwrap_or_default(),
        }
    }

    /// Value stored in the revision label of destination secrets
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SourceRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{REVISION_SEPARATOR}{}",
            self.resource_version, self.generation
        )
    }
}

/// Snapshot of the source TLS secret taken once per pass
#[derive(Clone)]
pub struct SourceSecret {
    pub namespace: String,
    pub name: String,
    pub data: BTreeMap<String, ByteString>,
    pub revision: SourceRevision,
}

impl fmt::Debug for SourceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSecret")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .field("revision", &self.revision)
            .finish()
    }
}

impl SourceSecret {
    #[must_use]
    pub fn from_secret(secret: Secret, namespace: &str, name: &str) -> Self {
        let revision = SourceRevision::of(&secret);
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            data: secret.data.unwrap_or_default(),
            revision,
        }
    }
}

/// Read the token of the first secret referenced by a service account
///
/// # Errors
///
/// - [`GeneratorError::NotFound`] if the service account, its secret reference
///   or the referenced secret does not exist
/// - [`GeneratorError::MissingField`] if the secret has no `token` field
/// - [`GeneratorError::Api`] if a lookup fails
pub async fn read_service_account_token(
    args: &OperationArgs,
    namespace: &str,
    service_account_name: &str,
) -> Result<ServiceAccountToken, GeneratorError> {
    let service_account = args
        .api
        .get_service_account(namespace, service_account_name)
        .await
        .map_err(|e| {
            error!(
                namespace,
                service_account_name,
                reason = %e,
                "Problem fetching service account"
            );
            GeneratorError::api("get service account", e)
        })?
        .ok_or_else(|| {
            error!(namespace, service_account_name, "Service account not found");
            GeneratorError::NotFound {
                kind: "service account",
                namespace: namespace.to_string(),
                name: service_account_name.to_string(),
            }
        })?;

    let Some(secret_name) = service_account
        .secrets
        .as_deref()
        .and_then(|references| references.first())
        .and_then(|reference| reference.name.clone())
    else {
        error!(namespace, service_account_name, "No secret found for the service account");
        return Err(GeneratorError::NotFound {
            kind: "token secret reference of service account",
            namespace: namespace.to_string(),
            name: service_account_name.to_string(),
        });
    };

    let secret = args
        .api
        .get_secret(namespace, &secret_name)
        .await
        .map_err(|e| {
            error!(
                namespace,
                service_account_name,
                service_account_secret_name = %secret_name,
                reason = %e,
                "Failed fetching the secret for a service account"
            );
            GeneratorError::api("get service account secret", e)
        })?
        .ok_or_else(|| {
            error!(
                namespace,
                service_account_name,
                service_account_secret_name = %secret_name,
                "Service account secret not found"
            );
            GeneratorError::NotFound {
                kind: "secret",
                namespace: namespace.to_string(),
                name: secret_name.clone(),
            }
        })?;

    let mut data = secret.data.unwrap_or_default();
    let Some(ByteString(token)) = data.remove(SERVICE_ACCOUNT_TOKEN_KEY) else {
        error!(
            namespace,
            service_account_secret_name = %secret_name,
            "Service account secret does not contain a token"
        );
        return Err(GeneratorError::MissingField {
            field: SERVICE_ACCOUNT_TOKEN_KEY.to_string(),
            namespace: namespace.to_string(),
            secret: secret_name,
        });
    };

    debug!(namespace, service_account_name, "Read service account token");
    Ok(ServiceAccountToken::new(token))
}

/// Read the configured source TLS secret
///
/// # Errors
///
/// [`GeneratorError::NotFound`] if the secret does not exist,
/// [`GeneratorError::Api`] if the lookup fails.
pub async fn read_source_secret(
    args: &OperationArgs,
    namespace: &str,
    name: &str,
) -> Result<SourceSecret, GeneratorError> {
    let start = Instant::now();
    let result = args.api.get_secret(namespace, name).await;
    metrics::observe_source_secret_read_duration(&args.config, start.elapsed().as_secs_f64());

    match result {
        Ok(Some(secret)) => {
            let source = SourceSecret::from_secret(secret, namespace, name);
            debug!(
                namespace,
                secret_name = name,
                source_revision = %source.revision,
                "Read source secret"
            );
            Ok(source)
        }
        Ok(None) => {
            error!(namespace, secret_name = name, "Source secret not found");
            Err(GeneratorError::NotFound {
                kind: "secret",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
        }
        Err(e) => {
            error!(namespace, secret_name = name, reason = %e, "Failed fetching a source secret");
            Err(GeneratorError::api("get source secret", e))
        }
    }
}

/// Extract the CA certificate bytes from the source secret
///
/// # Errors
///
/// [`GeneratorError::MissingField`] if `key` is absent.
pub fn read_ca_field(secret: &SourceSecret, key: &str) -> Result<Vec<u8>, GeneratorError> {
    match secret.data.get(key) {
        Some(ByteString(bytes)) => Ok(bytes.clone()),
        None => {
            error!(
                namespace = %secret.namespace,
                secret_name = %secret.name,
                secret_ca_key = key,
                "Required secret CA key not found in secret"
            );
            Err(GeneratorError::MissingField {
                field: key.to_string(),
                namespace: secret.namespace.clone(),
                secret: secret.name.clone(),
            })
        }
    }
}
