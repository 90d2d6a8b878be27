//! In-memory content model
//!
//! # Example
//!
//! ```json
//! {
//!   "namespaces": { "cm": "http://www.alfresco.org/model/content/1.0" },
//!   "properties": [
//!     { "name": "cm:name", "data_type": "d:text", "tokenization": "tokenized_exact" }
//!   ],
//!   "classes": [
//!     { "name": "cm:content", "kind": "type", "parent": "cm:cmobject" }
//!   ],
//!   "sites": { "marketing": "/app:company_home/st:sites/cm:marketing" }
//! }
//! ```

use super::dictionary::{ClassDef, ClassKind, Dictionary, PropertyDef, SiteDirectory, Tokenization};
use super::qname::{NamespaceResolver, QName};
use super::{
    APPLICATION_MODEL_URI, CONTENT_MODEL_URI, DICTIONARY_MODEL_URI, SITE_MODEL_URI,
    SYSTEM_MODEL_URI,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;

const BUILT_IN_DATA_TYPES: [&str; 15] = [
    "any", "text", "mltext", "content", "int", "long", "float", "double", "date", "datetime",
    "boolean", "qname", "noderef", "category", "locale",
];

/// Serializable description of a content model
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentModelSpec {
    /// Prefix to URI bindings, merged over the built-in prefixes
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
    /// Site short name to repository path
    #[serde(default)]
    pub sites: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub tokenization: Tokenization,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    pub kind: ClassKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "default_include_in_super_type")]
    pub include_in_super_type_query: bool,
}

fn default_include_in_super_type() -> bool {
    true
}

impl ContentModelSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn property(
        mut self,
        name: impl Into<String>,
        data_type: impl Into<String>,
        tokenization: Tokenization,
    ) -> Self {
        self.properties.push(PropertySpec {
            name: name.into(),
            data_type: data_type.into(),
            tokenization,
        });
        self
    }

    pub fn class(
        mut self,
        name: impl Into<String>,
        kind: ClassKind,
        parent: Option<&str>,
        include_in_super_type_query: bool,
    ) -> Self {
        self.classes.push(ClassSpec {
            name: name.into(),
            kind,
            parent: parent.map(String::from),
            include_in_super_type_query,
        });
        self
    }

    pub fn site(mut self, short_name: impl Into<String>, path: impl Into<String>) -> Self {
        self.sites.insert(short_name.into(), path.into());
        self
    }

    /// Resolve every name and build the model
    pub fn build(self) -> Result<ContentModel> {
        ContentModel::from_spec(self)
    }
}

/// Content model held in memory; implements every collaborator trait
#[derive(Clone, Debug)]
pub struct ContentModel {
    prefixes: BTreeMap<String, String>,
    properties: BTreeMap<QName, PropertyDef>,
    data_types: BTreeSet<QName>,
    classes: BTreeMap<QName, ClassDef>,
    sites: HashMap<String, String>,
}

impl ContentModel {
    /// A model with the built-in namespaces and data types only
    pub fn empty() -> Self {
        let mut prefixes = BTreeMap::new();
        prefixes.insert(String::new(), String::new());
        prefixes.insert("cm".to_string(), CONTENT_MODEL_URI.to_string());
        prefixes.insert("d".to_string(), DICTIONARY_MODEL_URI.to_string());
        prefixes.insert("sys".to_string(), SYSTEM_MODEL_URI.to_string());
        prefixes.insert("app".to_string(), APPLICATION_MODEL_URI.to_string());
        prefixes.insert("st".to_string(), SITE_MODEL_URI.to_string());

        let data_types = BUILT_IN_DATA_TYPES
            .iter()
            .map(|local| QName::new(DICTIONARY_MODEL_URI, *local))
            .collect();

        Self {
            prefixes,
            properties: BTreeMap::new(),
            data_types,
            classes: BTreeMap::new(),
            sites: HashMap::new(),
        }
    }

    pub fn from_spec(spec: ContentModelSpec) -> Result<Self> {
        let mut model = Self::empty();
        model.prefixes.extend(spec.namespaces);

        for property in spec.properties {
            let name = QName::parse(&property.name, &model)?;
            let data_type = QName::parse(&property.data_type, &model)?;
            model.data_types.insert(data_type.clone());
            model.properties.insert(
                name.clone(),
                PropertyDef {
                    name,
                    data_type,
                    tokenization: property.tokenization,
                },
            );
        }

        for class in spec.classes {
            let name = QName::parse(&class.name, &model)?;
            let parent = class
                .parent
                .as_deref()
                .map(|p| QName::parse(p, &model))
                .transpose()?;
            model.classes.insert(
                name.clone(),
                ClassDef {
                    name,
                    kind: class.kind,
                    parent,
                    include_in_super_type_query: class.include_in_super_type_query,
                },
            );
        }

        model.sites.extend(spec.sites);
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let spec: ContentModelSpec = serde_json::from_str(json)?;
        Self::from_spec(spec)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl Default for ContentModel {
    fn default() -> Self {
        Self::empty()
    }
}

impl NamespaceResolver for ContentModel {
    fn namespace_uri(&self, prefix: &str) -> Option<String> {
        self.prefixes.get(prefix).cloned()
    }

    fn prefix_for(&self, uri: &str) -> Option<String> {
        self.prefixes
            .iter()
            .find(|(_, u)| u.as_str() == uri)
            .map(|(p, _)| p.clone())
    }
}

impl Dictionary for ContentModel {
    fn property(&self, name: &QName) -> Option<PropertyDef> {
        self.properties.get(name).cloned()
    }

    fn is_data_type(&self, name: &QName) -> bool {
        self.data_types.contains(name)
    }

    fn properties_of_type(&self, data_type: &QName) -> Vec<PropertyDef> {
        self.properties
            .values()
            .filter(|p| &p.data_type == data_type)
            .cloned()
            .collect()
    }

    fn class(&self, name: &QName) -> Option<ClassDef> {
        self.classes.get(name).cloned()
    }

    fn sub_classes(&self, name: &QName) -> Vec<ClassDef> {
        let mut found = Vec::new();
        let mut queue = VecDeque::from([name.clone()]);

        while let Some(current) = queue.pop_front() {
            for class in self.classes.values() {
                if class.parent.as_ref() == Some(&current) && !found.contains(class) {
                    queue.push_back(class.name.clone());
                    found.push(class.clone());
                }
            }
        }

        found
    }

    fn all_properties(&self) -> Vec<PropertyDef> {
        self.properties.values().cloned().collect()
    }
}

impl SiteDirectory for ContentModel {
    fn site_path(&self, short_name: &str) -> Option<String> {
        self.sites.get(short_name).cloned()
    }
}
