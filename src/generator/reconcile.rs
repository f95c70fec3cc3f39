//! # Secret Reconciler
//!
//! Decides whether the destination secret of a namespace must be created,
//! updated, or left alone, then carries the decision out.
//!
//! The destination secret's revision label is the only signal used: a secret
//! whose label equals the current source revision is never rewritten.

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::generator::credentials::SourceSecret;
use crate::generator::kubeconfig::KubeConfig;
use crate::k8s::OperationArgs;
use crate::observability::metrics::{self, OperationOutcome, SecretOperation, TargetLabels};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info, warn};

/// What should happen to a destination secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// No destination secret exists
    Create,
    /// Secret exists with a missing or stale revision label
    Update { previous_revision: Option<String> },
    /// Secret was generated from the current source revision
    Skip,
    /// Secret exists and updates are disabled
    SkipUpdatesDisallowed,
}

/// What actually happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
    Unchanged,
    UpdatesDisallowed,
    WouldCreate,
    WouldUpdate,
}

impl ReconcileOutcome {
    /// Whether the store was written to
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, ReconcileOutcome::Created | ReconcileOutcome::Updated)
    }
}

/// Decide the action for an existing (or absent) destination secret
#[must_use]
pub fn decide(
    existing: Option<&Secret>,
    source_revision: &str,
    config: &GeneratorConfig,
) -> ReconcileAction {
    let Some(existing) = existing else {
        return ReconcileAction::Create;
    };

    if config.disallow_updates {
        return ReconcileAction::SkipUpdatesDisallowed;
    }

    let recorded = existing
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(&config.source_secret_revision_label));

    match recorded {
        Some(revision) if revision == source_revision => ReconcileAction::Skip,
        other => ReconcileAction::Update {
            previous_revision: other.cloned(),
        },
    }
}

/// Fresh destination secret carrying the kubeconfig and the revision label
#[must_use]
pub fn new_destination_secret(
    config: &GeneratorConfig,
    namespace: &str,
    kubeconfig: Vec<u8>,
    source_revision: &str,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(config.tenant_secret_name()),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([(
                config.source_secret_revision_label.clone(),
                source_revision.to_string(),
            )])),
            ..ObjectMeta::default()
        },
        data: Some(BTreeMap::from([(
            config.kubeconfig_secret_key.clone(),
            ByteString(kubeconfig),
        )])),
        ..Secret::default()
    }
}

/// Copy of `existing` with only the kubeconfig key and revision label replaced
#[must_use]
pub fn updated_destination_secret(
    existing: &Secret,
    config: &GeneratorConfig,
    kubeconfig: Vec<u8>,
    source_revision: &str,
) -> Secret {
    let mut secret = existing.clone();
    secret
        .metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(
            config.source_secret_revision_label.clone(),
            source_revision.to_string(),
        );
    secret
        .data
        .get_or_insert_with(BTreeMap::new)
        .insert(config.kubeconfig_secret_key.clone(), ByteString(kubeconfig));
    secret
}

/// Bring the destination secret of `namespace` in line with `kubeconfig`
///
/// # Errors
///
/// [`GeneratorError::Serialization`] if the kubeconfig cannot be encoded and
/// [`GeneratorError::Api`] if reading or writing the secret fails.
pub async fn reconcile_secret(
    args: &OperationArgs,
    namespace: &str,
    kubeconfig: &KubeConfig,
    source: &SourceSecret,
) -> Result<ReconcileOutcome, GeneratorError> {
    let config = &args.config;
    let secret_name = config.tenant_secret_name();
    let labels = TargetLabels::new(config, namespace);

    let existing = args
        .api
        .get_secret(namespace, &secret_name)
        .await
        .map_err(|e| {
            error!(
                namespace,
                secret_name = %secret_name,
                reason = %e,
                "Failed checking if secret exists"
            );
            GeneratorError::api("get destination secret", e)
        })?;

    let buffer = kubeconfig.to_bytes().inspect_err(|e| {
        error!(
            namespace,
            secret_name = %secret_name,
            reason = %e,
            "Failed serializing kubeconfig"
        );
    })?;
    let source_revision = source.revision.fingerprint();

    let action = decide(existing.as_ref(), &source_revision, config);
    match (action, existing) {
        (ReconcileAction::Skip, _) => {
            info!(
                namespace,
                secret_name = %secret_name,
                source_revision = %source_revision,
                "Nothing to do, secret was generated from the current source secret revision"
            );
            record_skip(&labels);
            Ok(ReconcileOutcome::Unchanged)
        }
        (ReconcileAction::SkipUpdatesDisallowed, _) => {
            warn!(
                namespace,
                secret_name = %secret_name,
                source_revision = %source_revision,
                "Secret exists and updates are disabled, skipping"
            );
            record_skip(&labels);
            Ok(ReconcileOutcome::UpdatesDisallowed)
        }
        (ReconcileAction::Create, _) => {
            let secret = new_destination_secret(config, namespace, buffer, &source_revision);
            create(args, &labels, &secret, &source_revision).await
        }
        (ReconcileAction::Update { previous_revision }, Some(existing)) => {
            let secret = updated_destination_secret(&existing, config, buffer, &source_revision);
            let previous = previous_revision.as_deref().unwrap_or("<not set>");
            update(args, &labels, &secret, previous, &source_revision).await
        }
        (ReconcileAction::Update { .. }, None) => {
            unreachable!("an update is only decided for an existing secret")
        }
    }
}

fn record_skip(labels: &TargetLabels<'_>) {
    metrics::record_operation(labels, SecretOperation::Skip, OperationOutcome::Skipped);
}

fn data_size(secret: &Secret, key: &str) -> usize {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map_or(0, |bytes| bytes.0.len())
}

async fn create(
    args: &OperationArgs,
    labels: &TargetLabels<'_>,
    secret: &Secret,
    source_revision: &str,
) -> Result<ReconcileOutcome, GeneratorError> {
    let namespace = labels.target_namespace;
    let secret_key = args.config.kubeconfig_secret_key.as_str();
    let secret_name = secret.metadata.name.as_deref().unwrap_or_default();

    if args.config.report_only {
        info!(
            namespace,
            secret_name,
            secret_key,
            source_revision,
            secret_data_size = data_size(secret, secret_key),
            "Report only: would create a secret"
        );
        record_skip(labels);
        return Ok(ReconcileOutcome::WouldCreate);
    }

    let start = Instant::now();
    let result = args.api.create_secret(namespace, secret).await;
    metrics::observe_target_secret_create_duration(labels, start.elapsed().as_secs_f64());

    match result {
        Ok(_) => {
            metrics::record_operation(labels, SecretOperation::Create, OperationOutcome::Success);
            info!(
                namespace,
                secret_name,
                secret_key,
                source_revision,
                "Secret created"
            );
            Ok(ReconcileOutcome::Created)
        }
        Err(e) => {
            metrics::record_operation(labels, SecretOperation::Create, OperationOutcome::Failure);
            error!(
                namespace,
                secret_name,
                secret_key,
                reason = %e,
                "Failed creating secret"
            );
            Err(GeneratorError::api("create destination secret", e))
        }
    }
}

async fn update(
    args: &OperationArgs,
    labels: &TargetLabels<'_>,
    secret: &Secret,
    previous_revision: &str,
    source_revision: &str,
) -> Result<ReconcileOutcome, GeneratorError> {
    let namespace = labels.target_namespace;
    let secret_key = args.config.kubeconfig_secret_key.as_str();
    let secret_name = secret.metadata.name.as_deref().unwrap_or_default();

    if args.config.report_only {
        info!(
            namespace,
            secret_name,
            secret_key,
            previous_revision,
            source_revision,
            secret_data_size = data_size(secret, secret_key),
            "Report only: would update a secret"
        );
        record_skip(labels);
        return Ok(ReconcileOutcome::WouldUpdate);
    }

    info!(
        namespace,
        secret_name,
        secret_key,
        previous_revision,
        source_revision,
        secret_data_size = data_size(secret, secret_key),
        "Secret will be updated"
    );

    let start = Instant::now();
    let result = args.api.update_secret(namespace, secret).await;
    metrics::observe_target_secret_update_duration(labels, start.elapsed().as_secs_f64());

    match result {
        Ok(_) => {
            metrics::record_operation(labels, SecretOperation::Update, OperationOutcome::Success);
            info!(
                namespace,
                secret_name,
                secret_key,
                previous_revision,
                source_revision,
                "Secret updated"
            );
            Ok(ReconcileOutcome::Updated)
        }
        Err(e) => {
            metrics::record_operation(labels, SecretOperation::Update, OperationOutcome::Failure);
            error!(
                namespace,
                secret_name,
                secret_key,
                source_revision,
                reason = %e,
                "Failed updating secret"
            );
            Err(GeneratorError::api("update destination secret", e))
        }
    }
}
