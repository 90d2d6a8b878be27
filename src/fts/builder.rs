//! Lowering of FTS syntax trees into constraint trees
//!
//! The builder resolves every leaf's field, expands field templates, applies
//! the auto-phrase rewrite for the requested rerank phase and turns clause
//! prefixes and boosts into constraint occurrence and boost.

use super::auto_phrase;
use super::constraint::{Constraint, ConstraintKind, Occur};
use super::parser::FtsParser;
use super::syntax::{Clause, Connective, Prefix, QueryMode, RerankPhase, SyntaxNode, Test};
use super::template::{self, TemplateRegistry};
use crate::classic::escape::{has_unescaped_wildcard, prefix_of, to_wildcard_pattern};
use crate::classic::is_reserved;
use crate::error::CompileError;
use crate::field::{DecoratedName, FieldRef, FieldResolver, MatchMode};
use crate::text;
use crate::Result;
use tracing::debug;

/// Field of the constraint a bare `*` compiles to
pub const EXISTENCE_FIELD: &str = "ISNODE";
/// Value of the constraint a bare `*` compiles to
pub const EXISTENCE_VALUE: &str = "T";

/// Per-request options for FTS compilation
#[derive(Clone, Debug)]
pub struct FtsOptions {
    pub templates: TemplateRegistry,
    /// Field used by leaves with no field of their own
    pub default_field: String,
    /// Connective between juxtaposed clauses inside `field:( ... )`
    pub default_connective: Connective,
    pub mode: QueryMode,
    pub rerank_phase: RerankPhase,
}

impl Default for FtsOptions {
    fn default() -> Self {
        Self {
            templates: TemplateRegistry::default(),
            default_field: "TEXT".to_string(),
            default_connective: Connective::And,
            mode: QueryMode::DefaultConjunction,
            rerank_phase: RerankPhase::SinglePass,
        }
    }
}

impl FtsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = field.into();
        self
    }

    pub fn with_default_connective(mut self, connective: Connective) -> Self {
        self.default_connective = connective;
        self
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_rerank_phase(mut self, phase: RerankPhase) -> Self {
        self.rerank_phase = phase;
        self
    }
}

/// Where a test sits while it is being lowered
#[derive(Clone, Copy)]
struct Scope<'s> {
    options: &'s FtsOptions,
    /// Field of the innermost enclosing field group
    group_field: Option<&'s str>,
    /// Inside an expanded template; templates do not nest
    in_template: bool,
}

/// Builds constraint trees from FTS expressions
pub struct ConstraintBuilder<'a> {
    resolver: FieldResolver<'a>,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(resolver: FieldResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Parse and lower an FTS expression
    pub fn build(&self, query: &str, options: &FtsOptions) -> Result<Constraint> {
        let tree = FtsParser::new(query, options.mode)?
            .with_field_connective(options.default_connective)
            .parse()?;
        let tree = auto_phrase::rewrite(tree, options.rerank_phase, &options.default_field);

        let scope = Scope {
            options,
            group_field: None,
            in_template: false,
        };
        let constraint = self.build_node(&tree, scope)?;
        debug!(query, leaves = constraint.leaves().len(), "built constraint tree");
        Ok(constraint)
    }

    fn build_node(&self, node: &SyntaxNode, scope: Scope<'_>) -> Result<Constraint> {
        match node {
            SyntaxNode::Disjunction(children) => Ok(Constraint::any_of(
                children
                    .iter()
                    .map(|c| self.build_node(c, scope))
                    .collect::<Result<_>>()?,
            )),
            SyntaxNode::Conjunction(children) => Ok(Constraint::all_of(
                children
                    .iter()
                    .map(|c| self.build_node(c, scope))
                    .collect::<Result<_>>()?,
            )),
            SyntaxNode::Clause(clause) => self.build_clause(clause, scope),
        }
    }

    fn build_clause(&self, clause: &Clause, scope: Scope<'_>) -> Result<Constraint> {
        let mut constraint = self.build_test(&clause.test, scope)?;
        if clause.prefix != Prefix::Default {
            constraint.occur = Occur::from(clause.prefix);
        }
        if let Some(boost) = clause.boost {
            constraint.boost = Some(boost);
        }
        Ok(constraint)
    }

    fn build_test(&self, test: &Test, scope: Scope<'_>) -> Result<Constraint> {
        match test {
            Test::Group(body) => self.build_node(body, scope),
            Test::FieldGroup { field, body } => self.build_node(
                body,
                Scope {
                    group_field: Some(field),
                    ..scope
                },
            ),
            Test::Placeholder { .. } => Err(CompileError::Unsupported(
                "template placeholder outside a template".to_string(),
            )),
            leaf => {
                let field = leaf.field().or(scope.group_field);
                if field.is_none() && is_match_anything(leaf) {
                    return Ok(existence());
                }

                let field = field.unwrap_or(&scope.options.default_field);
                if !scope.in_template {
                    if let Some(template) = scope.options.templates.get(field) {
                        debug!(field, "expanding field template");
                        let target = leaf.retarget(field).ok_or_else(|| {
                            CompileError::Internal("template applied to a non-leaf test".to_string())
                        })?;
                        let expanded = template::instantiate(template, &target)?;
                        return self.build_node(
                            &expanded,
                            Scope {
                                group_field: None,
                                in_template: true,
                                ..scope
                            },
                        );
                    }
                }
                self.build_leaf(leaf, field)
            }
        }
    }

    fn build_leaf(&self, leaf: &Test, field: &str) -> Result<Constraint> {
        let kind = match leaf {
            Test::Term { text, fuzzy, .. } => {
                let field = self.resolve(field, MatchMode::Default)?;
                if has_unescaped_wildcard(text) {
                    if fuzzy.is_some() {
                        return Err(CompileError::Unsupported(format!(
                            "fuzzy match on wildcard term '{}'",
                            text
                        )));
                    }
                    match prefix_of(text) {
                        Some(prefix) => ConstraintKind::PrefixTerm {
                            field,
                            prefix: text::extract(prefix),
                        },
                        None => ConstraintKind::WildTerm {
                            field,
                            pattern: to_wildcard_pattern(text),
                        },
                    }
                } else {
                    ConstraintKind::Term {
                        field,
                        text: text::extract(text),
                        fuzzy: *fuzzy,
                    }
                }
            }
            Test::ExactTerm { text, .. } => ConstraintKind::ExactTerm {
                field: self.resolve(field, MatchMode::ExactTerm)?,
                text: text::extract(text),
            },
            Test::Phrase { text, slop, .. } => ConstraintKind::Phrase {
                field: self.resolve(field, MatchMode::Default)?,
                text: text::extract(text),
                slop: *slop,
            },
            Test::ExactPhrase { text, .. } => ConstraintKind::ExactPhrase {
                field: self.resolve(field, MatchMode::ExactTerm)?,
                text: text::extract(text),
            },
            Test::Synonym { text, .. } => ConstraintKind::Synonym {
                field: self.resolve(field, MatchMode::Default)?,
                text: text::extract(text),
            },
            Test::Proximity {
                first,
                second,
                distance,
                ..
            } => ConstraintKind::Proximity {
                field: self.resolve(field, MatchMode::Default)?,
                first: text::extract(first),
                second: text::extract(second),
                distance: *distance,
            },
            Test::Range {
                lower,
                upper,
                include_lower,
                include_upper,
                ..
            } => ConstraintKind::Range {
                field: self.resolve(field, MatchMode::Default)?,
                lower: range_bound(lower),
                upper: range_bound(upper),
                include_lower: *include_lower,
                include_upper: *include_upper,
            },
            Test::Placeholder { .. } | Test::Group(_) | Test::FieldGroup { .. } => {
                return Err(CompileError::Internal(
                    "connective reached leaf lowering".to_string(),
                ))
            }
        };
        Ok(Constraint::new(kind))
    }

    /// Resolve a written field name; an exact test upgrades the default mode
    fn resolve(&self, field: &str, mode: MatchMode) -> Result<FieldRef> {
        let mut decorated = DecoratedName::parse(field);
        if decorated.mode == MatchMode::Default {
            decorated.mode = mode;
        }
        self.resolver.decorated_ref(decorated, is_reserved)
    }
}

fn is_match_anything(test: &Test) -> bool {
    matches!(test, Test::Term { text, fuzzy: None, .. } if text == "*")
}

fn existence() -> Constraint {
    Constraint::new(ConstraintKind::Term {
        field: FieldRef::reserved(EXISTENCE_FIELD),
        text: EXISTENCE_VALUE.to_string(),
        fuzzy: None,
    })
}

fn range_bound(bound: &str) -> Option<String> {
    if bound == "*" {
        None
    } else {
        Some(text::extract(bound))
    }
}
