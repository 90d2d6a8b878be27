use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// How `PATH` queries are compiled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStrategy {
    /// Span queries over the tokenized path field; relative paths still use regex
    #[default]
    Positional,
    /// Regular expressions over the raw path field
    Regex,
}

/// Per-deployment compiler configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Field used for unqualified terms
    pub default_field: String,
    /// Properties searched by the `TEXT` field
    pub text_fields: Vec<String>,
    /// Tokenized properties that also allow exact-term search
    pub exact_term_properties: BTreeSet<String>,
    /// Fields whose free-text fallback asks the engine to analyze wildcards
    pub wildcard_analysis_fields: BTreeSet<String>,
    /// Index field holding tokenized path segments
    pub path_field: String,
    /// Index field holding the raw path string
    pub path_regex_field: String,
    pub path_strategy: PathStrategy,
    /// Repository path under which sites live
    pub sites_root: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_field: "TEXT".to_string(),
            text_fields: vec!["cm:name".to_string(), "cm:content".to_string()],
            exact_term_properties: BTreeSet::new(),
            wildcard_analysis_fields: BTreeSet::new(),
            path_field: "PATH".to_string(),
            path_regex_field: "PATH.raw".to_string(),
            path_strategy: PathStrategy::Positional,
            sites_root: "/app:company_home/st:sites".to_string(),
        }
    }
}

impl CompilerConfig {
    /// Load a configuration from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = field.into();
        self
    }

    pub fn with_text_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exact_term_property(mut self, property: impl Into<String>) -> Self {
        self.exact_term_properties.insert(property.into());
        self
    }

    pub fn with_wildcard_analysis_field(mut self, field: impl Into<String>) -> Self {
        self.wildcard_analysis_fields.insert(field.into());
        self
    }

    pub fn with_path_strategy(mut self, strategy: PathStrategy) -> Self {
        self.path_strategy = strategy;
        self
    }

    pub fn with_sites_root(mut self, root: impl Into<String>) -> Self {
        self.sites_root = root.into();
        self
    }

    /// Whether exact-term search was switched on for a property
    pub fn allows_exact_term(&self, property: &str) -> bool {
        self.exact_term_properties.contains(property)
    }
}
