//! Field dispatch for classic queries
//!
//! [`FieldDispatchParser`] plugs into the generic [`QueryStringParser`] and
//! decides, field by field, what each leaf compiles to. Dispatch runs in two
//! stages:
//!
//! 1. reserved names (`TEXT`, `TYPE`, `PATH`, ...) from [`reserved`]
//! 2. content-model properties and data types through the [`Dictionary`]
//!
//! Fields that cannot be compiled are dropped with a warning; the rest of the
//! query still compiles.

use super::escape::{has_unescaped_wildcard, to_wildcard_pattern};
use super::parser::{DefaultOperator, QueryHooks, QueryStringParser};
use super::reserved::{self, ReservedField};
use crate::backend::{BackendQuery, BoolOccur, BooleanClause, WILDCARD_TOKEN};
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::field::{DecoratedName, FieldRef, FieldResolver, MatchMode, Resolution};
use crate::model::{
    ClassKind, Dictionary, NamespaceResolver, QName, SiteDirectory, DICTIONARY_MODEL_URI,
    TEXT_DATA_TYPES,
};
use crate::path::PathCompiler;
use crate::text;
use crate::Result;
use tracing::{debug, warn};

/// `SITE` value matching every site
pub const ALL_SITES: &str = "_ALL_SITES_";
/// `SITE` value matching every node
pub const EVERYTHING: &str = "_EVERYTHING_";

const TYPE_FIELD: &str = "TYPE";
const ASPECT_FIELD: &str = "ASPECT";
const QNAME_FIELD: &str = "QNAME";
const READER_FIELD: &str = "READER";
const OWNER_FIELD: &str = "OWNER";

/// Collaborators consulted while dispatching fields
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    pub dictionary: &'a dyn Dictionary,
    pub namespaces: &'a dyn NamespaceResolver,
    pub sites: &'a dyn SiteDirectory,
    pub config: &'a CompilerConfig,
}

/// Request-scoped holder of the slop for the phrase being built
#[derive(Debug, Default)]
pub struct PhraseSlot {
    held: Option<(u64, u32)>,
    issued: u64,
}

/// Proof of a [`PhraseSlot`] acquisition
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct SlotTicket(u64);

impl PhraseSlot {
    pub fn acquire(&mut self, slop: u32) -> Result<SlotTicket> {
        if let Some((ticket, _)) = self.held {
            return Err(CompileError::Internal(format!(
                "phrase slot already held by ticket {}",
                ticket
            )));
        }
        self.issued += 1;
        self.held = Some((self.issued, slop));
        Ok(SlotTicket(self.issued))
    }

    pub fn release(&mut self, ticket: SlotTicket) -> Result<()> {
        match self.held {
            Some((held, _)) if held == ticket.0 => {
                self.held = None;
                Ok(())
            }
            _ => Err(CompileError::Internal(format!(
                "phrase slot released with ticket {} it did not issue",
                ticket.0
            ))),
        }
    }

    /// Slop of the current holder, zero when free
    pub fn slop(&self) -> u32 {
        self.held.map(|(_, slop)| slop).unwrap_or(0)
    }
}

/// Low-level phrase construction; slop comes from the slot
fn phrase_query(field: &str, terms: Vec<String>, slot: &PhraseSlot) -> BackendQuery {
    BackendQuery::Phrase {
        field: field.to_string(),
        terms,
        slop: slot.slop(),
    }
}

/// One leaf as handed over by the query-string parser, text still raw
#[derive(Clone, Copy, Debug)]
enum Leaf<'t> {
    Text {
        text: &'t str,
        quoted: bool,
        slop: u32,
    },
    Prefix(&'t str),
    Wildcard(&'t str),
    Fuzzy {
        term: &'t str,
        similarity: f32,
    },
    Range {
        lower: Option<&'t str>,
        upper: Option<&'t str>,
        include_lower: bool,
        include_upper: bool,
    },
}

/// Classic query parser with reserved-field and content-model dispatch
pub struct FieldDispatchParser<'a> {
    ctx: DispatchContext<'a>,
    default_operator: DefaultOperator,
    phrase_slot: PhraseSlot,
}

impl<'a> FieldDispatchParser<'a> {
    pub fn new(ctx: DispatchContext<'a>) -> Self {
        Self {
            ctx,
            default_operator: DefaultOperator::Or,
            phrase_slot: PhraseSlot::default(),
        }
    }

    pub fn with_default_operator(mut self, operator: DefaultOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Compile a classic query; `None` means every clause was dropped
    pub fn parse(&mut self, query: &str) -> Result<Option<BackendQuery>> {
        let default_field = self.ctx.config.default_field.clone();
        let operator = self.default_operator;
        QueryStringParser::new(query, default_field, self)?
            .with_default_operator(operator)
            .parse()
    }

    fn resolver(&self) -> FieldResolver<'a> {
        FieldResolver::new(self.ctx.dictionary, self.ctx.namespaces, self.ctx.config)
    }

    fn dispatch(&mut self, raw_field: &str, leaf: Leaf<'_>) -> Result<Option<BackendQuery>> {
        if let Leaf::Text { text, .. } = leaf {
            if text::extract(text).trim().is_empty() {
                warn!(field = %raw_field, "empty value, clause ignored");
                return Ok(None);
            }
        }
        let decorated = DecoratedName::parse(raw_field);
        match reserved::lookup(&decorated.name) {
            Some(handler) => {
                debug!(field = %decorated.name, ?handler, "dispatching reserved field");
                self.reserved_query(handler, &decorated, leaf)
            }
            None => self.property_query(&decorated, leaf),
        }
    }

    fn reserved_query(
        &mut self,
        handler: ReservedField,
        decorated: &DecoratedName,
        leaf: Leaf<'_>,
    ) -> Result<Option<BackendQuery>> {
        let name = decorated.name.as_str();
        match handler {
            ReservedField::Unsupported => {
                warn!(field = %name, "unsupported field, clause ignored");
                Ok(None)
            }
            ReservedField::Text => self.text_query(decorated.mode, leaf),
            ReservedField::All => self.all_query(decorated.mode, leaf),
            ReservedField::Id
            | ReservedField::Ancestor
            | ReservedField::Parent
            | ReservedField::PrimaryParent
            | ReservedField::Owner
            | ReservedField::Reader
            | ReservedField::Denied => Ok(Some(untokenized_query(name, leaf))),
            ReservedField::Authority => Ok(BackendQuery::any_of(vec![
                untokenized_query(READER_FIELD, leaf),
                untokenized_query(OWNER_FIELD, leaf),
            ])),
            ReservedField::QName => self.qname_query(leaf),
            ReservedField::Type { exact } => self.class_query(TYPE_FIELD, ClassKind::Type, exact, leaf),
            ReservedField::Aspect { exact } => {
                self.class_query(ASPECT_FIELD, ClassKind::Aspect, exact, leaf)
            }
            ReservedField::Path => match leaf {
                Leaf::Text { text, .. } => self.path_query(name, &text::unescape(text)),
                _ => Ok(self.value_required(name)),
            },
            ReservedField::Tag => match leaf {
                Leaf::Text { text, .. } => {
                    let tag = text::extract(text).to_lowercase();
                    let path = format!("/cm:taggable/cm:{}/member", text::iso9075_encode(&tag));
                    self.path_query(name, &path)
                }
                _ => Ok(self.value_required(name)),
            },
            ReservedField::Site => match leaf {
                Leaf::Text { text, .. } => self.site_query(&text::extract(text)),
                _ => Ok(self.value_required(name)),
            },
            ReservedField::Exists | ReservedField::IsNotNull => self.existence_query(name, leaf, false),
            ReservedField::IsNull | ReservedField::IsUnset => self.existence_query(name, leaf, true),
        }
    }

    fn value_required(&self, field: &str) -> Option<BackendQuery> {
        warn!(field = %field, "field takes a plain value only, clause ignored");
        None
    }

    /// `TEXT`: the configured full-text properties
    fn text_query(&mut self, mode: MatchMode, leaf: Leaf<'_>) -> Result<Option<BackendQuery>> {
        let fields = self.ctx.config.text_fields.clone();
        let mut queries = Vec::with_capacity(fields.len());
        for name in fields {
            let decorated = DecoratedName { name, mode };
            if let Some(query) = self.property_query(&decorated, leaf)? {
                queries.push(query);
            }
        }
        Ok(BackendQuery::any_of(queries))
    }

    /// `ALL`: every text-typed property of the model
    fn all_query(&mut self, mode: MatchMode, leaf: Leaf<'_>) -> Result<Option<BackendQuery>> {
        let resolver = self.resolver();
        let dictionary = self.ctx.dictionary;
        let mut queries = Vec::new();

        for property in dictionary.all_properties() {
            let data_type = &property.data_type;
            if data_type.namespace != DICTIONARY_MODEL_URI
                || !TEXT_DATA_TYPES.contains(&data_type.local_name.as_str())
            {
                continue;
            }
            let field = match resolver.property_field(&property, None, mode) {
                Ok(field) => field,
                Err(CompileError::ExactTermNotEnabled { field }) => {
                    debug!(field = %field, "skipping property without exact-term support");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some(query) = self.field_leaf_query(&field, leaf)? {
                queries.push(query);
            }
        }
        Ok(BackendQuery::any_of(queries))
    }

    fn qname_query(&self, leaf: Leaf<'_>) -> Result<Option<BackendQuery>> {
        let Leaf::Text { text, .. } = leaf else {
            return Ok(Some(untokenized_query(QNAME_FIELD, leaf)));
        };
        if has_unescaped_wildcard(text) {
            return Ok(Some(untokenized_query(QNAME_FIELD, leaf)));
        }

        let value = text::extract(text);
        match QName::parse(&value, self.ctx.namespaces) {
            Ok(qname) => Ok(Some(BackendQuery::term(QNAME_FIELD, qname.to_string()))),
            Err(CompileError::UnknownPrefix(prefix)) => {
                warn!(field = QNAME_FIELD, prefix = %prefix, "unknown namespace prefix, clause ignored");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// `TYPE`/`ASPECT` and their exact forms
    fn class_query(
        &self,
        field: &str,
        kind: ClassKind,
        exact: bool,
        leaf: Leaf<'_>,
    ) -> Result<Option<BackendQuery>> {
        let text = match leaf {
            Leaf::Text { text, .. } if !has_unescaped_wildcard(text) => text,
            _ => return Ok(Some(untokenized_query(field, leaf))),
        };

        let value = text::extract(text);
        let class = match QName::parse(&value, self.ctx.namespaces) {
            Ok(qname) => self.ctx.dictionary.class(&qname),
            Err(CompileError::UnknownPrefix(_)) => None,
            Err(e) => return Err(e),
        };
        let Some(class) = class else {
            debug!(field = %field, class = %value, "class not in the content model, matching the literal name");
            return Ok(Some(BackendQuery::term(field, value)));
        };

        if class.kind != kind {
            debug!(field = %field, class = %class.name, "class kind does not match the field");
        }
        if exact {
            return Ok(Some(BackendQuery::term(field, class.name.to_string())));
        }

        let mut queries = vec![BackendQuery::term(field, class.name.to_string())];
        queries.extend(
            self.ctx
                .dictionary
                .sub_classes(&class.name)
                .into_iter()
                .filter(|sub| sub.include_in_super_type_query)
                .map(|sub| BackendQuery::term(field, sub.name.to_string())),
        );
        Ok(BackendQuery::any_of(queries))
    }

    fn path_query(&self, field: &str, expr: &str) -> Result<Option<BackendQuery>> {
        match PathCompiler::new(self.ctx.namespaces, self.ctx.config).compile(expr) {
            Ok(query) => Ok(Some(query)),
            Err(e @ (CompileError::Syntax { .. } | CompileError::UnknownPrefix(_))) => {
                warn!(field = %field, path = %expr, error = %e, "path not understood, clause ignored");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn site_query(&self, site: &str) -> Result<Option<BackendQuery>> {
        let root = &self.ctx.config.sites_root;
        let path = match site {
            EVERYTHING => return Ok(Some(BackendQuery::MatchAll)),
            ALL_SITES => format!("{}/*//*", root),
            _ => {
                let site_path = self.ctx.sites.site_path(site).unwrap_or_else(|| {
                    format!("{}/cm:{}", root, text::iso9075_encode(site))
                });
                format!("{}//*", site_path)
            }
        };
        self.path_query("SITE", &path)
    }

    /// `EXISTS`/`ISNOTNULL`, or with `negate` `ISNULL`/`ISUNSET`
    fn existence_query(
        &self,
        field: &str,
        leaf: Leaf<'_>,
        negate: bool,
    ) -> Result<Option<BackendQuery>> {
        let Leaf::Text { text, .. } = leaf else {
            return Ok(self.value_required(field));
        };
        let property = DecoratedName::parse(text);

        let target = match self.resolver().resolve(&property.name, MatchMode::Default) {
            Ok(Resolution::Property(_, target)) => target,
            Ok(_) | Err(CompileError::UnknownPrefix(_)) => {
                warn!(field = %field, property = %property.name, "unknown property, clause ignored");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let exists = BackendQuery::wildcard(target.index_field(), WILDCARD_TOKEN);
        if !negate {
            return Ok(Some(exists));
        }
        Ok(Some(BackendQuery::Boolean {
            clauses: vec![
                BooleanClause::new(BackendQuery::MatchAll, BoolOccur::Must),
                BooleanClause::new(exists, BoolOccur::MustNot),
            ],
        }))
    }

    /// Stage two: content-model properties and data types
    fn property_query(
        &mut self,
        decorated: &DecoratedName,
        leaf: Leaf<'_>,
    ) -> Result<Option<BackendQuery>> {
        let resolver = self.resolver();
        let dictionary = self.ctx.dictionary;
        match resolver.resolve(&decorated.name, decorated.mode) {
            Ok(Resolution::Property(_, field)) => self.field_leaf_query(&field, leaf),
            Ok(Resolution::DataType(data_type)) => {
                let mut queries = Vec::new();
                for property in dictionary.properties_of_type(&data_type) {
                    let field = resolver.property_field(&property, None, decorated.mode)?;
                    if let Some(query) = self.field_leaf_query(&field, leaf)? {
                        queries.push(query);
                    }
                }
                debug!(data_type = %decorated.name, properties = queries.len(), "expanded data type");
                Ok(BackendQuery::any_of(queries))
            }
            Ok(Resolution::Unknown) => {
                warn!(field = %decorated.name, "unknown property, clause ignored");
                Ok(None)
            }
            Err(CompileError::UnknownPrefix(prefix)) => {
                warn!(field = %decorated.name, prefix = %prefix, "unknown namespace prefix, clause ignored");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn field_leaf_query(&mut self, field: &FieldRef, leaf: Leaf<'_>) -> Result<Option<BackendQuery>> {
        let index_field = field.index_field();
        match leaf {
            Leaf::Text { text, quoted, slop }
                if field.is_tokenized() && field.mode != MatchMode::ExactTerm =>
            {
                self.tokenized_text_query(&index_field, text, quoted, slop)
            }
            _ => Ok(Some(untokenized_query(&index_field, leaf))),
        }
    }

    fn tokenized_text_query(
        &mut self,
        field: &str,
        text: &str,
        quoted: bool,
        slop: u32,
    ) -> Result<Option<BackendQuery>> {
        if has_unescaped_wildcard(text) {
            // every token required, wildcards kept inside their own token
            let clauses = split_unescaped_whitespace(text)
                .into_iter()
                .map(|token| {
                    let query = if has_unescaped_wildcard(token) {
                        BackendQuery::wildcard(field, to_wildcard_pattern(token))
                    } else {
                        BackendQuery::term(field, text::extract(token))
                    };
                    BooleanClause::new(query, BoolOccur::Must)
                })
                .collect();
            return Ok(BackendQuery::combine(clauses));
        }

        let mut tokens: Vec<String> = text::extract(text)
            .split_whitespace()
            .map(str::to_string)
            .collect();
        match tokens.len() {
            0 => {
                warn!(field = %field, "value has no terms, clause ignored");
                Ok(None)
            }
            1 => Ok(tokens.pop().map(|token| BackendQuery::term(field, token))),
            _ if quoted => {
                let ticket = if slop > 0 {
                    Some(self.phrase_slot.acquire(slop)?)
                } else {
                    None
                };
                let query = phrase_query(field, tokens, &self.phrase_slot);
                if let Some(ticket) = ticket {
                    self.phrase_slot.release(ticket)?;
                }
                Ok(Some(query))
            }
            _ => {
                let occur = match self.default_operator {
                    DefaultOperator::And => BoolOccur::Must,
                    DefaultOperator::Or => BoolOccur::Should,
                };
                Ok(BackendQuery::combine(
                    tokens
                        .into_iter()
                        .map(|token| BooleanClause::new(BackendQuery::term(field, token), occur))
                        .collect(),
                ))
            }
        }
    }
}

impl QueryHooks for FieldDispatchParser<'_> {
    fn field_query(
        &mut self,
        field: &str,
        text: &str,
        quoted: bool,
        slop: u32,
    ) -> Result<Option<BackendQuery>> {
        self.dispatch(field, Leaf::Text { text, quoted, slop })
    }

    fn prefix_query(&mut self, field: &str, prefix: &str) -> Result<Option<BackendQuery>> {
        self.dispatch(field, Leaf::Prefix(prefix))
    }

    fn wildcard_query(&mut self, field: &str, pattern: &str) -> Result<Option<BackendQuery>> {
        self.dispatch(field, Leaf::Wildcard(pattern))
    }

    fn fuzzy_query(
        &mut self,
        field: &str,
        term: &str,
        similarity: f32,
    ) -> Result<Option<BackendQuery>> {
        self.dispatch(field, Leaf::Fuzzy { term, similarity })
    }

    fn range_query(
        &mut self,
        field: &str,
        lower: Option<&str>,
        upper: Option<&str>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Option<BackendQuery>> {
        self.dispatch(
            field,
            Leaf::Range {
                lower,
                upper,
                include_lower,
                include_upper,
            },
        )
    }
}

/// A leaf on a single-term field
fn untokenized_query(field: &str, leaf: Leaf<'_>) -> BackendQuery {
    match leaf {
        Leaf::Text { text, .. } | Leaf::Wildcard(text) if has_unescaped_wildcard(text) => {
            BackendQuery::wildcard(field, to_wildcard_pattern(text))
        }
        Leaf::Text { text, .. } | Leaf::Wildcard(text) => BackendQuery::term(field, text::extract(text)),
        Leaf::Prefix(prefix) => BackendQuery::Prefix {
            field: field.to_string(),
            prefix: text::extract(prefix),
        },
        Leaf::Fuzzy { term, similarity } => BackendQuery::Fuzzy {
            field: field.to_string(),
            term: text::extract(term),
            similarity,
        },
        Leaf::Range {
            lower,
            upper,
            include_lower,
            include_upper,
        } => BackendQuery::Range {
            field: field.to_string(),
            lower: lower.map(text::extract),
            upper: upper.map(text::extract),
            include_lower,
            include_upper,
        },
    }
}

/// Split on whitespace that is not backslash-escaped
fn split_unescaped_whitespace(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(&text[s..i]);
            }
            continue;
        }
        if ch == '\\' {
            escaped = true;
        }
        start.get_or_insert(i);
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SpanQuery;
    use crate::model::{ContentModel, ContentModelSpec, Tokenization, CONTENT_MODEL_URI};

    fn model() -> ContentModel {
        ContentModelSpec::new()
            .property("cm:name", "d:text", Tokenization::TokenizedExact)
            .property("cm:title", "d:mltext", Tokenization::Tokenized)
            .property("cm:content", "d:content", Tokenization::Tokenized)
            .property("cm:code", "d:text", Tokenization::Untokenized)
            .property("cm:size", "d:long", Tokenization::Untokenized)
            .class("cm:cmobject", ClassKind::Type, None, true)
            .class("cm:content", ClassKind::Type, Some("cm:cmobject"), true)
            .class("cm:folder", ClassKind::Type, Some("cm:cmobject"), true)
            .class("cm:hidden", ClassKind::Type, Some("cm:cmobject"), false)
            .class("cm:titled", ClassKind::Aspect, None, true)
            .site("marketing", "/app:company_home/st:sites/cm:marketing")
            .build()
            .unwrap()
    }

    fn compile_with(query: &str, config: &CompilerConfig) -> Result<Option<BackendQuery>> {
        let model = model();
        let ctx = DispatchContext {
            dictionary: &model,
            namespaces: &model,
            sites: &model,
            config,
        };
        FieldDispatchParser::new(ctx).parse(query)
    }

    fn compile(query: &str) -> Result<Option<BackendQuery>> {
        compile_with(query, &CompilerConfig::default())
    }

    fn cm(local: &str) -> String {
        format!("{{{}}}{}", CONTENT_MODEL_URI, local)
    }

    fn should_terms(field: &str, values: &[String]) -> BackendQuery {
        BackendQuery::Boolean {
            clauses: values
                .iter()
                .map(|v| BooleanClause::new(BackendQuery::term(field, v.clone()), BoolOccur::Should))
                .collect(),
        }
    }

    #[test]
    fn test_type_expands_sub_classes() {
        let query = compile("TYPE:\"cm:cmobject\"").unwrap().unwrap();
        assert_eq!(
            query,
            should_terms("TYPE", &[cm("cmobject"), cm("content"), cm("folder")])
        );
    }

    #[test]
    fn test_exact_type_and_unknown_class() {
        assert_eq!(
            compile(r"EXACTTYPE:cm\:cmobject").unwrap(),
            Some(BackendQuery::term("TYPE", cm("cmobject")))
        );
        assert_eq!(
            compile(r"TYPE:cm\:nothing").unwrap(),
            Some(BackendQuery::term("TYPE", "cm:nothing"))
        );
        assert_eq!(
            compile("ASPECT:\"cm:titled\"").unwrap(),
            Some(BackendQuery::term("ASPECT", cm("titled")))
        );
    }

    #[test]
    fn test_unsupported_field_is_dropped() {
        assert_eq!(compile("DBID:12").unwrap(), None);
        assert_eq!(
            compile(r"DBID:12 ID:abc").unwrap(),
            Some(BackendQuery::term("ID", "abc"))
        );
    }

    #[test]
    fn test_empty_values_are_dropped() {
        assert_eq!(compile("ID:\"\"").unwrap(), None);
        assert_eq!(compile(r#"@cm\:title:"  ""#).unwrap(), None);
        assert_eq!(
            compile(r#"ID:"" ID:abc"#).unwrap(),
            Some(BackendQuery::term("ID", "abc"))
        );
    }

    #[test]
    fn test_unknown_property_is_dropped() {
        assert_eq!(compile(r"cm\:nope:x").unwrap(), None);
        assert_eq!(compile(r"zz\:title:x").unwrap(), None);
    }

    #[test]
    fn test_exact_term_validation() {
        let err = compile(r"=cm\:title:report").unwrap_err();
        assert!(matches!(err, CompileError::ExactTermNotEnabled { ref field } if field == "cm:title"));

        assert_eq!(
            compile(r"=cm\:name:report").unwrap(),
            Some(BackendQuery::term("cm:name.exact", "report"))
        );

        let config = CompilerConfig::default().with_exact_term_property("cm:title");
        assert_eq!(
            compile_with(r"=@cm\:title:report", &config).unwrap(),
            Some(BackendQuery::term("cm:title.exact", "report"))
        );
    }

    #[test]
    fn test_data_type_disjunction() {
        let query = compile(r"d\:text:abc").unwrap().unwrap();
        assert_eq!(
            query,
            BackendQuery::Boolean {
                clauses: vec![
                    BooleanClause::new(BackendQuery::term("cm:code", "abc"), BoolOccur::Should),
                    BooleanClause::new(BackendQuery::term("cm:name", "abc"), BoolOccur::Should),
                ]
            }
        );
    }

    #[test]
    fn test_phrase_slop() {
        assert_eq!(
            compile(r#"cm\:title:"big brown dog"~2"#).unwrap(),
            Some(BackendQuery::Phrase {
                field: "cm:title".to_string(),
                terms: vec!["big".to_string(), "brown".to_string(), "dog".to_string()],
                slop: 2,
            })
        );
    }

    #[test]
    fn test_wildcards_on_tokenized_field() {
        assert_eq!(
            compile(r#"cm\:title:"big do*""#).unwrap(),
            Some(BackendQuery::Boolean {
                clauses: vec![
                    BooleanClause::new(BackendQuery::term("cm:title", "big"), BoolOccur::Must),
                    BooleanClause::new(BackendQuery::wildcard("cm:title", "do*"), BoolOccur::Must),
                ]
            })
        );
    }

    #[test]
    fn test_wildcards_on_untokenized_field() {
        assert_eq!(
            compile(r#"cm\:code:"AB 1?""#).unwrap(),
            Some(BackendQuery::wildcard("cm:code", "AB 1?"))
        );
        assert_eq!(
            compile(r"cm\:code:50%").unwrap(),
            Some(BackendQuery::wildcard("cm:code", "50*"))
        );
        assert_eq!(
            compile(r"cm\:code:AB*").unwrap(),
            Some(BackendQuery::Prefix {
                field: "cm:code".to_string(),
                prefix: "AB".to_string()
            })
        );
    }

    #[test]
    fn test_derived_field_range() {
        assert_eq!(
            compile(r"cm\:content.size:[100 TO *]").unwrap(),
            Some(BackendQuery::Range {
                field: "cm:content.size".to_string(),
                lower: Some("100".to_string()),
                upper: None,
                include_lower: true,
                include_upper: true,
            })
        );
    }

    #[test]
    fn test_text_field_spans_configured_fields() {
        let expected = BackendQuery::Boolean {
            clauses: vec![
                BooleanClause::new(BackendQuery::term("cm:name", "report"), BoolOccur::Should),
                BooleanClause::new(BackendQuery::term("cm:content", "report"), BoolOccur::Should),
            ],
        };
        assert_eq!(compile("report").unwrap(), Some(expected.clone()));
        assert_eq!(compile("TEXT:report").unwrap(), Some(expected));
    }

    #[test]
    fn test_all_field() {
        let query = compile("ALL:report").unwrap().unwrap();
        let fields: Vec<String> = match query {
            BackendQuery::Boolean { clauses } => clauses
                .iter()
                .filter_map(|c| c.query.field().map(str::to_string))
                .collect(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(fields, vec!["cm:code", "cm:content", "cm:name", "cm:title"]);
    }

    #[test]
    fn test_path_field() {
        let query = compile("PATH:\"/app:company_home\"").unwrap().unwrap();
        assert!(matches!(query, BackendQuery::Span(SpanQuery::First { .. })));

        assert_eq!(compile("PATH:\"/zz:x\"").unwrap(), None);
        assert_eq!(compile("PATH:\"/a/\"").unwrap(), None);
        assert!(matches!(
            compile("PATH:\"/a[1]\""),
            Err(CompileError::Unsupported(_))
        ));
    }

    #[test]
    fn test_tag_field() {
        let query = compile("TAG:\"Big News\"").unwrap().unwrap();
        let rendered = query.to_string();
        assert!(rendered.contains("PATH:taggable"), "{}", rendered);
        assert!(rendered.contains("PATH:big news"), "{}", rendered);
        assert!(rendered.contains("PATH:member"), "{}", rendered);
    }

    #[test]
    fn test_site_field() {
        assert_eq!(compile("SITE:_EVERYTHING_").unwrap(), Some(BackendQuery::MatchAll));

        let known = compile("SITE:marketing").unwrap().unwrap().to_string();
        assert!(known.contains("PATH:marketing"), "{}", known);

        let fallback = compile("SITE:sales").unwrap().unwrap().to_string();
        assert!(fallback.contains("PATH:sales"), "{}", fallback);

        let all = compile("SITE:_ALL_SITES_").unwrap().unwrap().to_string();
        assert!(all.contains("PATH:sites"), "{}", all);
    }

    #[test]
    fn test_existence_fields() {
        assert_eq!(
            compile("EXISTS:\"cm:title\"").unwrap(),
            Some(BackendQuery::wildcard("cm:title", "*"))
        );
        assert_eq!(
            compile(r"ISNULL:cm\:title").unwrap(),
            Some(BackendQuery::Boolean {
                clauses: vec![
                    BooleanClause::new(BackendQuery::MatchAll, BoolOccur::Must),
                    BooleanClause::new(BackendQuery::wildcard("cm:title", "*"), BoolOccur::MustNot),
                ]
            })
        );
        assert_eq!(compile("ISNOTNULL:\"cm:nope\"").unwrap(), None);
    }

    #[test]
    fn test_authority_and_qname() {
        assert_eq!(
            compile("AUTHORITY:bob").unwrap(),
            Some(BackendQuery::Boolean {
                clauses: vec![
                    BooleanClause::new(BackendQuery::term("READER", "bob"), BoolOccur::Should),
                    BooleanClause::new(BackendQuery::term("OWNER", "bob"), BoolOccur::Should),
                ]
            })
        );
        assert_eq!(
            compile("QNAME:\"cm:report\"").unwrap(),
            Some(BackendQuery::term("QNAME", cm("report")))
        );
    }

    #[test]
    fn test_phrase_slot_guards() {
        let mut slot = PhraseSlot::default();
        assert_eq!(slot.slop(), 0);

        let ticket = slot.acquire(3).unwrap();
        assert_eq!(slot.slop(), 3);
        assert!(matches!(slot.acquire(1), Err(CompileError::Internal(_))));
        slot.release(ticket).unwrap();
        assert_eq!(slot.slop(), 0);

        let first = slot.acquire(1).unwrap();
        slot.release(first).unwrap();
        let _second = slot.acquire(2).unwrap();
        assert!(matches!(slot.release(SlotTicket(1)), Err(CompileError::Internal(_))));
    }

    #[test]
    fn test_split_unescaped_whitespace() {
        assert_eq!(split_unescaped_whitespace(r"a b\ c  d*"), vec!["a", r"b\ c", "d*"]);
    }
}
