//! Qualified names and namespace resolution

use crate::error::CompileError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolves namespace prefixes to URIs and back
///
/// Implementations are shared between concurrent compilations and must
/// tolerate concurrent reads.
pub trait NamespaceResolver: Send + Sync {
    /// URI bound to a prefix; the empty prefix is the default namespace
    fn namespace_uri(&self, prefix: &str) -> Option<String>;

    /// A prefix bound to a URI
    fn prefix_for(&self, uri: &str) -> Option<String>;
}

/// A namespace URI plus local name
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    pub namespace: String,
    pub local_name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Parse `{uri}local`, `prefix:local` or a bare `local`
    pub fn parse(text: &str, namespaces: &dyn NamespaceResolver) -> Result<Self> {
        if let Some(rest) = text.strip_prefix('{') {
            let (uri, local) = rest.split_once('}').ok_or_else(|| {
                CompileError::syntax(text.len(), "'}'", format!("qualified name '{}'", text))
            })?;
            return Ok(Self::new(uri, local));
        }

        let (prefix, local) = text.split_once(':').unwrap_or(("", text));
        let uri = namespaces
            .namespace_uri(prefix)
            .ok_or_else(|| CompileError::UnknownPrefix(prefix.to_string()))?;
        Ok(Self::new(uri, local))
    }

    /// Render as `prefix:local`, falling back to `{uri}local`
    pub fn to_prefix_string(&self, namespaces: &dyn NamespaceResolver) -> String {
        match namespaces.prefix_for(&self.namespace) {
            Some(prefix) if prefix.is_empty() => self.local_name.clone(),
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}
