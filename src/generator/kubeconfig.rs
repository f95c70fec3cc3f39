//! # Kubeconfig Builder
//!
//! Builds the tenant kubeconfig: one cluster pointing at the proxy with its
//! CA embedded, one context, and one bearer-token user. The result is
//! validated structurally before it is handed to the reconciler.

use crate::constants::KUBECONFIG_DEFAULT_NAME;
use crate::error::GeneratorError;
use crate::generator::credentials::ServiceAccountToken;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    pub users: Vec<NamedAuthInfo>,
    #[serde(rename = "current-context")]
    pub current_context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    pub server: String,
    /// Base64-encoded PEM bundle
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub certificate_authority_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub cluster: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAuthInfo {
    pub name: String,
    pub user: AuthInfo,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AuthInfo {
    pub token: String,
}

impl fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInfo").field("token", &"***").finish()
    }
}

impl KubeConfig {
    /// Build and validate a single cluster/context/user kubeconfig
    ///
    /// The cluster and context are both named `default`; the user entry and the
    /// context namespace are named after `auth_context_name`.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Validation`] if the token is not UTF-8 or the result
    /// does not validate.
    pub fn build(
        token: &ServiceAccountToken,
        ca_certificate: &[u8],
        server: &str,
        auth_context_name: &str,
    ) -> Result<Self, GeneratorError> {
        let token = std::str::from_utf8(token.as_bytes())
            .map_err(|e| GeneratorError::Validation(format!("token is not valid UTF-8: {e}")))?;

        let config = Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![NamedCluster {
                name: KUBECONFIG_DEFAULT_NAME.to_string(),
                cluster: Cluster {
                    server: server.to_string(),
                    certificate_authority_data: STANDARD.encode(ca_certificate),
                },
            }],
            contexts: vec![NamedContext {
                name: KUBECONFIG_DEFAULT_NAME.to_string(),
                context: Context {
                    cluster: KUBECONFIG_DEFAULT_NAME.to_string(),
                    user: auth_context_name.to_string(),
                    namespace: Some(auth_context_name.to_string()),
                },
            }],
            users: vec![NamedAuthInfo {
                name: auth_context_name.to_string(),
                user: AuthInfo {
                    token: token.to_string(),
                },
            }],
            current_context: KUBECONFIG_DEFAULT_NAME.to_string(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that every name the config refers to resolves
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Validation`] describing every problem found.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        let mut problems = Vec::new();

        if self.current_context.is_empty() {
            problems.push("current-context is not set".to_string());
        } else if !self.contexts.iter().any(|c| c.name == self.current_context) {
            problems.push(format!(
                "current-context '{}' has no matching context",
                self.current_context
            ));
        }

        for named in &self.clusters {
            if named.name.is_empty() {
                problems.push("cluster entry has an empty name".to_string());
            }
            if named.cluster.server.trim().is_empty() {
                problems.push(format!("cluster '{}' has no server", named.name));
            }
            if !named.cluster.certificate_authority_data.is_empty()
                && STANDARD
                    .decode(&named.cluster.certificate_authority_data)
                    .is_err()
            {
                problems.push(format!(
                    "cluster '{}' certificate-authority-data is not base64",
                    named.name
                ));
            }
        }

        for named in &self.contexts {
            if named.name.is_empty() {
                problems.push("context entry has an empty name".to_string());
            }
            if !self.clusters.iter().any(|c| c.name == named.context.cluster) {
                problems.push(format!(
                    "context '{}' refers to unknown cluster '{}'",
                    named.name, named.context.cluster
                ));
            }
            if !self.users.iter().any(|u| u.name == named.context.user) {
                problems.push(format!(
                    "context '{}' refers to unknown user '{}'",
                    named.name, named.context.user
                ));
            }
            if named.context.namespace.as_deref() == Some("") {
                problems.push(format!("context '{}' has an empty namespace", named.name));
            }
        }

        for named in &self.users {
            if named.name.is_empty() {
                problems.push("user entry has an empty name".to_string());
            }
            if named.user.token.is_empty() {
                problems.push(format!("user '{}' has an empty token", named.name));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(GeneratorError::Validation(problems.join("; ")))
        }
    }

    /// Canonical YAML form stored in the destination secret
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Serialization`] if YAML encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GeneratorError> {
        Ok(serde_yaml::to_string(self)?.into_bytes())
    }

    /// Parse a kubeconfig previously produced by [`KubeConfig::to_bytes`]
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Serialization`] if the bytes are not a kubeconfig.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GeneratorError> {
        Ok(serde_yaml::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> ServiceAccountToken {
        ServiceAccountToken::new(b"eyJhbGciOi.token".to_vec())
    }

    #[test]
    fn test_build_single_triple() {
        let config =
            KubeConfig::build(&token(), b"CA-PEM", "https://proxy:6443", "proxy-system").unwrap();

        assert_eq!(config.current_context, "default");
        assert_eq!(config.clusters.len(), 1);
        assert_eq!(config.contexts.len(), 1);
        assert_eq!(config.users.len(), 1);

        let cluster = &config.clusters[0];
        assert_eq!(cluster.name, "default");
        assert_eq!(cluster.cluster.server, "https://proxy:6443");
        assert_eq!(
            STANDARD.decode(&cluster.cluster.certificate_authority_data).unwrap(),
            b"CA-PEM"
        );

        let context = &config.contexts[0].context;
        assert_eq!(context.cluster, "default");
        assert_eq!(context.user, "proxy-system");
        assert_eq!(context.namespace.as_deref(), Some("proxy-system"));

        assert_eq!(config.users[0].name, "proxy-system");
        assert_eq!(config.users[0].user.token, "eyJhbGciOi.token");
    }

    #[test]
    fn test_build_rejects_empty_token() {
        let err = KubeConfig::build(
            &ServiceAccountToken::new(Vec::new()),
            b"CA",
            "https://proxy",
            "proxy-system",
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::Validation(ref msg) if msg.contains("empty token")));
    }

    #[test]
    fn test_build_rejects_empty_server() {
        let err = KubeConfig::build(&token(), b"CA", "", "proxy-system").unwrap_err();
        assert!(matches!(err, GeneratorError::Validation(ref msg) if msg.contains("no server")));
    }

    #[test]
    fn test_build_rejects_non_utf8_token() {
        let err = KubeConfig::build(
            &ServiceAccountToken::new(vec![0xff, 0xfe]),
            b"CA",
            "https://proxy",
            "proxy-system",
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::Validation(_)));
    }

    #[test]
    fn test_validate_detects_dangling_references() {
        let mut config =
            KubeConfig::build(&token(), b"CA", "https://proxy", "proxy-system").unwrap();
        config.contexts[0].context.cluster = "elsewhere".to_string();
        config.current_context = "missing".to_string();

        let Err(GeneratorError::Validation(msg)) = config.validate() else {
            panic!("expected validation failure");
        };
        assert!(msg.contains("unknown cluster 'elsewhere'"));
        assert!(msg.contains("current-context 'missing'"));
    }

    #[test]
    fn test_yaml_layout() {
        let config = KubeConfig::build(&token(), b"CA", "https://proxy", "proxy-system").unwrap();
        let yaml = String::from_utf8(config.to_bytes().unwrap()).unwrap();

        assert!(yaml.contains("apiVersion: v1"));
        assert!(yaml.contains("kind: Config"));
        assert!(yaml.contains("current-context: default"));
        assert!(yaml.contains("certificate-authority-data: Q0E="));
        assert!(yaml.contains("token: eyJhbGciOi.token"));
        assert_eq!(KubeConfig::from_bytes(yaml.as_bytes()).unwrap(), config);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = KubeConfig::build(&token(), b"CA", "https://proxy", "proxy-system").unwrap();
        assert!(!format!("{config:?}").contains("eyJhbGciOi"));
    }
}
