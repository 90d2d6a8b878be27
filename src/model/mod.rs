//! Content-model collaborators
//!
//! The compiler consults three read-only services: namespace resolution, the
//! content-model dictionary and the site directory. They are traits so a
//! deployment can back them with its own repository; [`ContentModel`] is an
//! in-memory implementation of all three, loadable from JSON.

pub mod dictionary;
pub mod memory;
pub mod qname;

pub use dictionary::{ClassDef, ClassKind, Dictionary, PropertyDef, SiteDirectory, Tokenization};
pub use memory::{ContentModel, ContentModelSpec};
pub use qname::{NamespaceResolver, QName};

/// Namespace of the core content model (`cm`)
pub const CONTENT_MODEL_URI: &str = "http://www.alfresco.org/model/content/1.0";
/// Namespace of the data-type dictionary (`d`)
pub const DICTIONARY_MODEL_URI: &str = "http://www.alfresco.org/model/dictionary/1.0";
/// Namespace of the system model (`sys`)
pub const SYSTEM_MODEL_URI: &str = "http://www.alfresco.org/model/system/1.0";
/// Namespace of the application model (`app`)
pub const APPLICATION_MODEL_URI: &str = "http://www.alfresco.org/model/application/1.0";
/// Namespace of the site model (`st`)
pub const SITE_MODEL_URI: &str = "http://www.alfresco.org/model/site/1.0";

/// Data types whose properties take part in full-text search
pub const TEXT_DATA_TYPES: [&str; 3] = ["text", "mltext", "content"];
