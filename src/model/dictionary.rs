//! Content-model dictionary interface
//!
//! The dictionary is the compiler's extensible symbol table: every field name
//! outside the reserved set is looked up here as a property or a data type.

use super::qname::QName;
use serde::{Deserialize, Serialize};

/// How a property's values are represented in the index
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tokenization {
    /// Split into terms by the analyzer
    #[default]
    Tokenized,
    /// Indexed as a single term
    Untokenized,
    /// Tokenized, with an exact-term representation kept alongside
    TokenizedExact,
}

impl Tokenization {
    /// Whether a value is split into several terms at index time
    pub fn is_tokenized(&self) -> bool {
        !matches!(self, Tokenization::Untokenized)
    }
}

/// Whether a class is a type or an aspect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Type,
    Aspect,
}

/// A property declared by the content model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: QName,
    pub data_type: QName,
    pub tokenization: Tokenization,
}

/// A type or aspect declared by the content model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    pub name: QName,
    pub kind: ClassKind,
    pub parent: Option<QName>,
    /// Whether queries on an ancestor class also match this class
    pub include_in_super_type_query: bool,
}

/// Read-only access to the content model
pub trait Dictionary: Send + Sync {
    fn property(&self, name: &QName) -> Option<PropertyDef>;

    /// Whether the name denotes a data type (such as `d:text`)
    fn is_data_type(&self, name: &QName) -> bool;

    /// All properties declared with the given data type
    fn properties_of_type(&self, data_type: &QName) -> Vec<PropertyDef>;

    fn class(&self, name: &QName) -> Option<ClassDef>;

    /// Transitive subclasses, not including the class itself
    fn sub_classes(&self, name: &QName) -> Vec<ClassDef>;

    fn all_properties(&self) -> Vec<PropertyDef>;
}

/// Resolves site short names to repository paths
pub trait SiteDirectory: Send + Sync {
    fn site_path(&self, short_name: &str) -> Option<String>;
}
