//! # Namespace Resolver
//!
//! Turns the configured fixed namespace or label selectors into the target
//! namespaces of one pass.

use crate::k8s::OperationArgs;
use crate::observability::metrics;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{error, info};

/// Target namespaces for this pass, sorted and de-duplicated
///
/// Without selectors this is the fixed namespace. With selectors it is every
/// namespace matching at least one expression; a failed query leaves the pass
/// with no namespaces.
pub async fn resolve_namespaces(args: &OperationArgs) -> Vec<String> {
    let config = &args.config;
    if !config.uses_namespace_selector() {
        return vec![config.namespace.clone()];
    }

    match find_namespaces(args, config.namespace_selector.expressions()).await {
        Ok(namespaces) => {
            info!(
                selector = %config.namespace_selector,
                namespaces = ?namespaces,
                "Discovered namespaces"
            );
            namespaces
        }
        Err(e) => {
            error!(
                selector = %config.namespace_selector,
                reason = %e,
                "Failed finding namespaces by label selector"
            );
            Vec::new()
        }
    }
}

/// Union of the namespaces matched by each expression
///
/// A single Kubernetes selector string ANDs its terms, so every expression is
/// listed on its own.
///
/// # Errors
///
/// The first failed list call.
pub async fn find_namespaces(
    args: &OperationArgs,
    expressions: &[String],
) -> anyhow::Result<Vec<String>> {
    let mut found = BTreeSet::new();

    for expression in expressions {
        let start = Instant::now();
        let result = args.api.list_namespaces(expression).await;
        metrics::observe_namespace_list_duration(start.elapsed().as_secs_f64());
        found.extend(result?);
    }

    Ok(found.into_iter().collect())
}
