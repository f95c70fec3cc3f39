use super::ClusterApi;
use crate::config::GeneratorConfig;
use std::sync::Arc;
use tracing::Span;

/// Everything an operation needs: the configuration, the cluster, and the span to log under
#[derive(Clone)]
pub struct OperationArgs {
    pub config: Arc<GeneratorConfig>,
    pub api: Arc<dyn ClusterApi>,
    pub span: Span,
}

impl std::fmt::Debug for OperationArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationArgs")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OperationArgs {
    pub fn new(config: Arc<GeneratorConfig>, api: Arc<dyn ClusterApi>) -> Self {
        let span = tracing::info_span!(
            "generator",
            service_account = %config.service_account_name,
            tenant_secret = %config.tenant_secret_name(),
        );
        Self { config, api, span }
    }
}
