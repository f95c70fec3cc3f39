//! # Metrics
//!
//! Prometheus metrics for monitoring the generator.
//!
//! ## Metrics Exposed
//!
//! - `proxy_kubeconfig_generator_success_total` - Namespaces whose kubeconfig secret is current
//! - `proxy_kubeconfig_generator_failure_total` - Namespaces that failed a pass
//! - `proxy_kubeconfig_generator_operations_total` - Create/update/skip decisions by outcome
//! - `proxy_kubeconfig_generator_namespaces` - Namespaces targeted by the last pass
//! - `proxy_kubeconfig_generator_runs_total` - Completed passes
//! - `proxy_kubeconfig_generator_namespace_list_duration_seconds` - Namespace list latency
//! - `proxy_kubeconfig_generator_source_secret_read_duration_seconds` - Source secret
//!   read latency
//! - `proxy_kubeconfig_generator_target_secret_create_duration_seconds` - Destination
//!   create latency
//! - `proxy_kubeconfig_generator_target_secret_update_duration_seconds` - Destination
//!   update latency
//!
//! Per-namespace metrics carry `service_account`, `secret_name`,
//! `secret_namespace` and `target_namespace` labels.

use crate::config::GeneratorConfig;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

const TUPLE_LABELS: [&str; 4] = [
    "service_account",
    "secret_name",
    "secret_namespace",
    "target_namespace",
];

const LATENCY_BUCKETS: [f64; 8] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

static SUCCESS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "proxy_kubeconfig_generator_success_total",
            "Proxy kubeconfig generator success counts",
        ),
        &TUPLE_LABELS,
    )
    .expect("Failed to create SUCCESS_TOTAL metric - this should never happen")
});

static FAILURE_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "proxy_kubeconfig_generator_failure_total",
            "Proxy kubeconfig generator failure counts",
        ),
        &TUPLE_LABELS,
    )
    .expect("Failed to create FAILURE_TOTAL metric - this should never happen")
});

static OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "proxy_kubeconfig_generator_operations_total",
            "Destination secret operations by type and outcome",
        ),
        &[
            "operation",
            "outcome",
            "service_account",
            "secret_name",
            "secret_namespace",
            "target_namespace",
        ],
    )
    .expect("Failed to create OPERATIONS_TOTAL metric - this should never happen")
});

static NAMESPACES: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "proxy_kubeconfig_generator_namespaces",
        "Number of namespaces targeted by the last pass",
    )
    .expect("Failed to create NAMESPACES metric - this should never happen")
});

static RUNS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "proxy_kubeconfig_generator_runs_total",
        "Number of completed passes",
    )
    .expect("Failed to create RUNS_TOTAL metric - this should never happen")
});

static NAMESPACE_LIST_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "proxy_kubeconfig_generator_namespace_list_duration_seconds",
            "Duration of namespace list calls in seconds",
        )
        .buckets(LATENCY_BUCKETS.to_vec()),
    )
    .expect("Failed to create NAMESPACE_LIST_DURATION metric - this should never happen")
});

static SOURCE_SECRET_READ_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "proxy_kubeconfig_generator_source_secret_read_duration_seconds",
            "Duration of source secret reads in seconds",
        )
        .buckets(LATENCY_BUCKETS.to_vec()),
        &["service_account", "secret_name", "secret_namespace"],
    )
    .expect("Failed to create SOURCE_SECRET_READ_DURATION metric - this should never happen")
});

static TARGET_SECRET_CREATE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "proxy_kubeconfig_generator_target_secret_create_duration_seconds",
            "Duration of destination secret create calls in seconds",
        )
        .buckets(LATENCY_BUCKETS.to_vec()),
        &TUPLE_LABELS,
    )
    .expect("Failed to create TARGET_SECRET_CREATE_DURATION metric - this should never happen")
});

static TARGET_SECRET_UPDATE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "proxy_kubeconfig_generator_target_secret_update_duration_seconds",
            "Duration of destination secret update calls in seconds",
        )
        .buckets(LATENCY_BUCKETS.to_vec()),
        &TUPLE_LABELS,
    )
    .expect("Failed to create TARGET_SECRET_UPDATE_DURATION metric - this should never happen")
});

/// Destination secret operation recorded in `operations_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOperation {
    Create,
    Update,
    Skip,
}

impl SecretOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SecretOperation::Create => "create",
            SecretOperation::Update => "update",
            SecretOperation::Skip => "skip",
        }
    }
}

/// Outcome label of a [`SecretOperation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    Success,
    Failure,
    Skipped,
}

impl OperationOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OperationOutcome::Success => "success",
            OperationOutcome::Failure => "failure",
            OperationOutcome::Skipped => "skipped",
        }
    }
}

/// Label values identifying one (service account, source secret, target namespace) tuple
#[derive(Debug, Clone)]
pub struct TargetLabels<'a> {
    pub service_account: &'a str,
    pub secret_name: &'a str,
    pub secret_namespace: &'a str,
    pub target_namespace: &'a str,
}

impl<'a> TargetLabels<'a> {
    #[must_use]
    pub fn new(config: &'a GeneratorConfig, target_namespace: &'a str) -> Self {
        Self {
            service_account: &config.service_account_name,
            secret_name: &config.server_tls_secret_name,
            secret_namespace: &config.server_tls_secret_namespace,
            target_namespace,
        }
    }

    fn values(&self) -> [&'a str; 4] {
        [
            self.service_account,
            self.secret_name,
            self.secret_namespace,
            self.target_namespace,
        ]
    }
}

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(SUCCESS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FAILURE_TOTAL.clone()))?;
    REGISTRY.register(Box::new(OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NAMESPACES.clone()))?;
    REGISTRY.register(Box::new(RUNS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NAMESPACE_LIST_DURATION.clone()))?;
    REGISTRY.register(Box::new(SOURCE_SECRET_READ_DURATION.clone()))?;
    REGISTRY.register(Box::new(TARGET_SECRET_CREATE_DURATION.clone()))?;
    REGISTRY.register(Box::new(TARGET_SECRET_UPDATE_DURATION.clone()))?;

    Ok(())
}

/// Gather every registered metric family
#[must_use]
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn record_success(labels: &TargetLabels<'_>) {
    SUCCESS_TOTAL.with_label_values(&labels.values()).inc();
}

pub fn record_failure(labels: &TargetLabels<'_>) {
    FAILURE_TOTAL.with_label_values(&labels.values()).inc();
}

pub fn record_operation(
    labels: &TargetLabels<'_>,
    operation: SecretOperation,
    outcome: OperationOutcome,
) {
    let [service_account, secret_name, secret_namespace, target_namespace] = labels.values();
    OPERATIONS_TOTAL
        .with_label_values(&[
            operation.as_str(),
            outcome.as_str(),
            service_account,
            secret_name,
            secret_namespace,
            target_namespace,
        ])
        .inc();
}

pub fn set_namespace_count(count: usize) {
    NAMESPACES.set(i64::try_from(count).unwrap_or(i64::MAX));
}

pub fn increment_runs() {
    RUNS_TOTAL.inc();
}

pub fn observe_namespace_list_duration(duration: f64) {
    NAMESPACE_LIST_DURATION.observe(duration);
}

pub fn observe_source_secret_read_duration(config: &GeneratorConfig, duration: f64) {
    SOURCE_SECRET_READ_DURATION
        .with_label_values(&[
            config.service_account_name.as_str(),
            config.server_tls_secret_name.as_str(),
            config.server_tls_secret_namespace.as_str(),
        ])
        .observe(duration);
}

pub fn observe_target_secret_create_duration(labels: &TargetLabels<'_>, duration: f64) {
    TARGET_SECRET_CREATE_DURATION
        .with_label_values(&labels.values())
        .observe(duration);
}

pub fn observe_target_secret_update_duration(labels: &TargetLabels<'_>, duration: f64) {
    TARGET_SECRET_UPDATE_DURATION
        .with_label_values(&labels.values())
        .observe(duration);
}

#[cfg(test)]
pub(crate) fn operation_count(
    labels: &TargetLabels<'_>,
    operation: SecretOperation,
    outcome: OperationOutcome,
) -> u64 {
    let [service_account, secret_name, secret_namespace, target_namespace] = labels.values();
    OPERATIONS_TOTAL
        .with_label_values(&[
            operation.as_str(),
            outcome.as_str(),
            service_account,
            secret_name,
            secret_namespace,
            target_namespace,
        ])
        .get()
}

#[cfg(test)]
pub(crate) fn create_duration_count(labels: &TargetLabels<'_>) -> u64 {
    TARGET_SECRET_CREATE_DURATION
        .with_label_values(&labels.values())
        .get_sample_count()
}

#[cfg(test)]
pub(crate) fn update_duration_count(labels: &TargetLabels<'_>) -> u64 {
    TARGET_SECRET_UPDATE_DURATION
        .with_label_values(&labels.values())
        .get_sample_count()
}
