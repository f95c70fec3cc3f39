//! # Namespace Selector
//!
//! Repeatable `--namespace-label-selector` values. Each value is a complete
//! Kubernetes label selector; a namespace is targeted when it matches any of them.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceSelector {
    expressions: Vec<String>,
}

impl NamespaceSelector {
    pub fn new<I, S>(expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expressions: expressions.into_iter().map(Into::into).collect(),
        }
    }

    /// Add one more selector expression
    pub fn push(&mut self, expression: impl Into<String>) {
        self.expressions.push(expression.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    #[must_use]
    pub fn expressions(&self) -> &[String] {
        &self.expressions
    }
}

impl fmt::Display for NamespaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expressions.is_empty() {
            return f.write_str("<not set>");
        }
        f.write_str(&self.expressions.join(" OR "))
    }
}
