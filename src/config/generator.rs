//! # Generator Configuration
//!
//! The immutable parameters of a generator run. Built once from the command
//! line, validated once, then shared by every pass behind an `Arc`.

use crate::config::NamespaceSelector;
use crate::constants::{
    DEFAULT_KUBECONFIG_SECRET_KEY, DEFAULT_NAMESPACE, DEFAULT_SOURCE_SECRET_REVISION_LABEL,
    DEFAULT_TLS_SECRET_CA_KEY, TENANT_SECRET_SUFFIX,
};
use crate::error::ConfigError;
use std::time::Duration;

#[derive(Debug, Clone)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Flags map one to one onto command line switches"
)]
pub struct GeneratorConfig {
    /// Service account whose token is embedded in the kubeconfig
    pub service_account_name: String,
    /// Target namespace used when no selector is configured
    pub namespace: String,
    /// Label selectors used to discover target namespaces
    pub namespace_selector: NamespaceSelector,
    /// URL of the proxy-fronted API server written into the kubeconfig
    pub server: String,
    /// Namespace of the source TLS secret
    pub server_tls_secret_namespace: String,
    /// Name of the source TLS secret
    pub server_tls_secret_name: String,
    /// Key of the CA certificate inside the source TLS secret
    pub server_tls_secret_ca_key: String,
    /// Key of the kubeconfig inside the destination secret
    pub kubeconfig_secret_key: String,
    /// Label recording the source revision on the destination secret
    pub source_secret_revision_label: String,
    /// Time between two passes
    pub iteration_interval: Duration,
    /// Never update an existing destination secret
    pub disallow_updates: bool,
    /// Log decisions without mutating anything
    pub report_only: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            service_account_name: String::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            namespace_selector: NamespaceSelector::default(),
            server: String::new(),
            server_tls_secret_namespace: DEFAULT_NAMESPACE.to_string(),
            server_tls_secret_name: String::new(),
            server_tls_secret_ca_key: DEFAULT_TLS_SECRET_CA_KEY.to_string(),
            kubeconfig_secret_key: DEFAULT_KUBECONFIG_SECRET_KEY.to_string(),
            source_secret_revision_label: DEFAULT_SOURCE_SECRET_REVISION_LABEL.to_string(),
            iteration_interval: Duration::from_secs(10),
            disallow_updates: false,
            report_only: false,
        }
    }
}

impl GeneratorConfig {
    /// Name of the destination secret, `<service-account>-kubeconfig`
    #[must_use]
    pub fn tenant_secret_name(&self) -> String {
        format!("{}{TENANT_SECRET_SUFFIX}", self.service_account_name)
    }

    /// Whether target namespaces come from label selectors rather than `namespace`
    #[must_use]
    pub fn uses_namespace_selector(&self) -> bool {
        !self.namespace_selector.is_empty()
    }

    /// Validate the configuration before any API call is made
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first missing or invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_account_name.trim().is_empty() {
            return Err(ConfigError::Missing("service account name"));
        }
        if self.server.trim().is_empty() {
            return Err(ConfigError::Missing("server url"));
        }
        if self.server_tls_secret_name.trim().is_empty() {
            return Err(ConfigError::Missing("server TLS secret name"));
        }
        if self.server_tls_secret_ca_key.is_empty() {
            return Err(ConfigError::Missing("server TLS secret CA key"));
        }
        if self.kubeconfig_secret_key.is_empty() {
            return Err(ConfigError::Missing("kubeconfig secret key"));
        }
        if self.source_secret_revision_label.is_empty() {
            return Err(ConfigError::Missing("source secret revision label"));
        }
        if !self.uses_namespace_selector() && self.namespace.trim().is_empty() {
            return Err(ConfigError::Missing("namespace"));
        }
        if self
            .namespace_selector
            .expressions()
            .iter()
            .any(|expression| expression.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                field: "namespace label selector",
                reason: "selector expressions cannot be blank".to_string(),
            });
        }
        if self.iteration_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "iteration interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
