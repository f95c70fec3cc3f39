//! # Run Loop
//!
//! Fixed-interval scheduler. One pass runs immediately, then one per interval
//! until shutdown is requested. Shutdown is only observed between passes, so a
//! pass always runs to completion.

use crate::error::GeneratorError;
use crate::generator::{self, ReconcileOutcome, SourceSecretCache};
use crate::k8s::OperationArgs;
use crate::observability::metrics::{self, TargetLabels};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument};

/// Result of one pass over the target namespaces
#[derive(Debug, Default)]
pub struct PassReport {
    /// Namespaces resolved for this pass, in processing order
    pub namespaces: Vec<String>,
    pub outcomes: BTreeMap<String, ReconcileOutcome>,
    pub errors: BTreeMap<String, GeneratorError>,
}

impl PassReport {
    /// Number of secrets created or updated
    #[must_use]
    pub fn writes(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_write()).count()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run a single pass
///
/// Failures are scoped to their namespace: they are collected into the
/// report, counted, and logged once the pass is over.
pub async fn run_once(args: &OperationArgs) -> PassReport {
    let namespaces = generator::resolve_namespaces(args).await;
    metrics::set_namespace_count(namespaces.len());

    let mut report = PassReport {
        namespaces: namespaces.clone(),
        ..PassReport::default()
    };
    let mut source_cache = SourceSecretCache::new();

    for namespace in namespaces {
        let labels = TargetLabels::new(&args.config, &namespace);
        match generator::generate_for_namespace(args, &namespace, &mut source_cache).await {
            Ok(outcome) => {
                metrics::record_success(&labels);
                report.outcomes.insert(namespace, outcome);
            }
            Err(e) => {
                metrics::record_failure(&labels);
                report.errors.insert(namespace, e);
            }
        }
    }

    metrics::increment_runs();

    for (namespace, e) in &report.errors {
        error!(namespace = %namespace, reason = %e, "Failed generating kubeconfig");
    }
    debug!(
        namespaces = report.namespaces.len(),
        writes = report.writes(),
        errors = report.errors.len(),
        "Pass finished"
    );

    report
}

/// Run passes until `shutdown` is cancelled
pub async fn run(args: OperationArgs, shutdown: CancellationToken) {
    let interval = args.config.iteration_interval;
    info!(
        interval = ?interval,
        selector = %args.config.namespace_selector,
        report_only = args.config.report_only,
        disallow_updates = args.config.disallow_updates,
        "Starting run loop"
    );

    loop {
        run_once(&args).instrument(args.span.clone()).await;

        tokio::select! {
            () = shutdown.cancelled() => {
                info!("Shutdown requested, exiting run loop");
                break;
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}
