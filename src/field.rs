//! Field references and their resolution against the content model
//!
//! Both surface syntaxes name fields the same way: a reserved upper-case
//! name (`TYPE`, `PATH`, ...), or a content-model property written as
//! `prefix:local`, `{uri}local` or `@prefix:local`, optionally followed by a
//! derived-field suffix such as `.size`. Field names may carry decorations
//! asking for exact-term (`=name`) or untokenized (`name.untokenized`)
//! matching.

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::model::{Dictionary, NamespaceResolver, PropertyDef, QName, Tokenization};
use crate::text;
use crate::Result;
use serde::Serialize;
use tracing::debug;

/// Decoration suffix requesting untokenized matching
pub const UNTOKENIZED_SUFFIX: &str = ".untokenized";
/// Index sub-field holding the exact-term representation
pub const EXACT_SUFFIX: &str = ".exact";

/// Matching requested by a field decoration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Default,
    ExactTerm,
    Untokenized,
}

/// Secondary index fields derived from a content property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedField {
    Size,
    Mimetype,
    Encoding,
    Locale,
}

impl DerivedField {
    const ALL: [DerivedField; 4] = [
        DerivedField::Size,
        DerivedField::Mimetype,
        DerivedField::Encoding,
        DerivedField::Locale,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            DerivedField::Size => ".size",
            DerivedField::Mimetype => ".mimetype",
            DerivedField::Encoding => ".encoding",
            DerivedField::Locale => ".locale",
        }
    }

    /// Split a known derived suffix off a field name
    pub fn split(name: &str) -> (&str, Option<DerivedField>) {
        for derived in Self::ALL {
            if let Some(base) = name.strip_suffix(derived.suffix()) {
                if !base.is_empty() {
                    return (base, Some(derived));
                }
            }
        }
        (name, None)
    }
}

/// What a field name denotes
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Reserved,
    Property,
    DataType,
    /// Not known to the content model; passed through by name
    Unresolved,
}

/// A field name after decoration stripping and content-model resolution
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldRef {
    /// Reserved name, or the property in `prefix:local` form
    pub name: String,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedField>,
    pub tokenization: Tokenization,
    pub mode: MatchMode,
}

impl FieldRef {
    pub fn reserved(name: impl Into<String>) -> Self {
        let name = name.into();
        let tokenization = if name == "TEXT" || name == "ALL" {
            Tokenization::Tokenized
        } else {
            Tokenization::Untokenized
        };
        Self {
            name,
            kind: FieldKind::Reserved,
            derived: None,
            tokenization,
            mode: MatchMode::Default,
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether values for this field are split into several terms
    pub fn is_tokenized(&self) -> bool {
        self.derived.is_none()
            && self.mode != MatchMode::Untokenized
            && self.tokenization.is_tokenized()
    }

    /// Name of the index field a query against this reference targets
    pub fn index_field(&self) -> String {
        let mut field = self.name.clone();
        if let Some(derived) = self.derived {
            field.push_str(derived.suffix());
            return field;
        }
        if self.mode == MatchMode::ExactTerm && self.tokenization.is_tokenized() {
            field.push_str(EXACT_SUFFIX);
        }
        field
    }
}

/// A raw field name split into its name and requested match mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoratedName {
    pub name: String,
    pub mode: MatchMode,
}

impl DecoratedName {
    /// Strip `=`, `@` and `.untokenized` decorations and backslash escapes
    pub fn parse(raw: &str) -> Self {
        let mut name = raw.trim();
        let mut mode = MatchMode::Default;

        if let Some(rest) = name.strip_prefix('=') {
            name = rest;
            mode = MatchMode::ExactTerm;
        }
        if let Some(rest) = name.strip_suffix(UNTOKENIZED_SUFFIX) {
            name = rest;
            mode = MatchMode::Untokenized;
        }
        let name = name.strip_prefix('@').unwrap_or(name);

        Self {
            name: text::unescape(name),
            mode,
        }
    }
}

/// Resolves field names through the namespace resolver and dictionary
pub struct FieldResolver<'a> {
    dictionary: &'a dyn Dictionary,
    namespaces: &'a dyn NamespaceResolver,
    config: &'a CompilerConfig,
}

/// Outcome of resolving a non-reserved field name
#[derive(Debug)]
pub enum Resolution {
    Property(PropertyDef, FieldRef),
    DataType(QName),
    Unknown,
}

impl<'a> FieldResolver<'a> {
    pub fn new(
        dictionary: &'a dyn Dictionary,
        namespaces: &'a dyn NamespaceResolver,
        config: &'a CompilerConfig,
    ) -> Self {
        Self {
            dictionary,
            namespaces,
            config,
        }
    }

    pub fn namespaces(&self) -> &'a dyn NamespaceResolver {
        self.namespaces
    }

    pub fn dictionary(&self) -> &'a dyn Dictionary {
        self.dictionary
    }

    pub fn config(&self) -> &'a CompilerConfig {
        self.config
    }

    /// Resolve a property or data-type name with an explicit match mode
    pub fn resolve(&self, name: &str, mode: MatchMode) -> Result<Resolution> {
        let (base, derived) = DerivedField::split(name);
        let qname = QName::parse(base, self.namespaces)?;

        if let Some(property) = self.dictionary.property(&qname) {
            let field = self.property_field(&property, derived, mode)?;
            return Ok(Resolution::Property(property, field));
        }
        if derived.is_none() && self.dictionary.is_data_type(&qname) {
            return Ok(Resolution::DataType(qname));
        }
        Ok(Resolution::Unknown)
    }

    /// Build the field reference for a known property, validating the mode
    pub fn property_field(
        &self,
        property: &PropertyDef,
        derived: Option<DerivedField>,
        mode: MatchMode,
    ) -> Result<FieldRef> {
        let name = property.name.to_prefix_string(self.namespaces);

        if mode == MatchMode::ExactTerm && derived.is_none() {
            let allowed = match property.tokenization {
                Tokenization::Untokenized | Tokenization::TokenizedExact => true,
                Tokenization::Tokenized => self.config.allows_exact_term(&name),
            };
            if !allowed {
                return Err(CompileError::ExactTermNotEnabled { field: name });
            }
        }
        if mode == MatchMode::Untokenized && property.tokenization == Tokenization::Tokenized {
            debug!(field = %name, "untokenized match requested on a tokenized-only property");
        }

        Ok(FieldRef {
            name,
            kind: FieldKind::Property,
            derived,
            tokenization: property.tokenization,
            mode,
        })
    }

    /// Resolve any field name to a reference, falling back to a pass-through
    ///
    /// Used where the caller only needs a labelled, tokenization-resolved field
    /// and does not expand data types.
    pub fn field_ref(&self, raw: &str, is_reserved: impl Fn(&str) -> bool) -> Result<FieldRef> {
        self.decorated_ref(DecoratedName::parse(raw), is_reserved)
    }

    /// [`field_ref`](Self::field_ref) for an already split name
    pub fn decorated_ref(
        &self,
        decorated: DecoratedName,
        is_reserved: impl Fn(&str) -> bool,
    ) -> Result<FieldRef> {
        if is_reserved(&decorated.name) {
            return Ok(FieldRef::reserved(decorated.name).with_mode(decorated.mode));
        }

        match self.resolve(&decorated.name, decorated.mode) {
            Ok(Resolution::Property(_, field)) => Ok(field),
            Ok(Resolution::DataType(qname)) => Ok(FieldRef {
                name: qname.to_prefix_string(self.namespaces),
                kind: FieldKind::DataType,
                derived: None,
                tokenization: Tokenization::Tokenized,
                mode: decorated.mode,
            }),
            Ok(Resolution::Unknown) | Err(CompileError::UnknownPrefix(_)) => {
                debug!(field = %decorated.name, "field not found in the content model");
                let (base, derived) = DerivedField::split(&decorated.name);
                Ok(FieldRef {
                    name: base.to_string(),
                    kind: FieldKind::Unresolved,
                    derived,
                    tokenization: Tokenization::Tokenized,
                    mode: decorated.mode,
                })
            }
            Err(e) => Err(e),
        }
    }
}
