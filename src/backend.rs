//! Backend query objects
//!
//! The classic and path compilers lower into this vocabulary, which mirrors
//! the query classes of a Lucene-family engine. Every object also renders to
//! the engine's textual query syntax, used when a target has no structured
//! equivalent.

use crate::classic::escape::{escape_field, escape_literal, escape_value};
use serde::Serialize;
use std::fmt;

/// Span term value matching any token
pub const WILDCARD_TOKEN: &str = "*";

/// How a clause participates in a boolean query
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOccur {
    /// Must match, contributes to score
    Must,
    /// Must match, no scoring
    Filter,
    /// Optional, contributes to score
    Should,
    /// Must not match
    MustNot,
}

impl BoolOccur {
    fn symbol(&self) -> &'static str {
        match self {
            BoolOccur::Must => "+",
            BoolOccur::Filter => "#",
            BoolOccur::Should => "",
            BoolOccur::MustNot => "-",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BooleanClause {
    pub query: BackendQuery,
    pub occur: BoolOccur,
}

impl BooleanClause {
    pub fn new(query: BackendQuery, occur: BoolOccur) -> Self {
        Self { query, occur }
    }
}

/// Positional query vocabulary
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanQuery {
    Term {
        field: String,
        value: String,
    },
    Near {
        clauses: Vec<SpanQuery>,
        slop: u32,
        in_order: bool,
    },
    /// Matches `inner` only when it ends at or before position `end`
    First {
        inner: Box<SpanQuery>,
        end: u32,
    },
    Or {
        clauses: Vec<SpanQuery>,
    },
    /// Presents `inner` as if it were on another field
    FieldMasking {
        inner: Box<SpanQuery>,
        field: String,
    },
}

impl SpanQuery {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        SpanQuery::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn near(clauses: Vec<SpanQuery>, slop: u32, in_order: bool) -> Self {
        SpanQuery::Near {
            clauses,
            slop,
            in_order,
        }
    }

    pub fn first(inner: SpanQuery, end: u32) -> Self {
        SpanQuery::First {
            inner: Box::new(inner),
            end,
        }
    }
}

/// A backend query object
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendQuery {
    Term {
        field: String,
        value: String,
    },
    Boolean {
        clauses: Vec<BooleanClause>,
    },
    Wildcard {
        field: String,
        pattern: String,
    },
    Prefix {
        field: String,
        prefix: String,
    },
    Regexp {
        field: String,
        pattern: String,
    },
    Span(SpanQuery),
    Phrase {
        field: String,
        terms: Vec<String>,
        slop: u32,
    },
    Range {
        field: String,
        lower: Option<String>,
        upper: Option<String>,
        include_lower: bool,
        include_upper: bool,
    },
    Fuzzy {
        field: String,
        term: String,
        similarity: f32,
    },
    Boost {
        query: Box<BackendQuery>,
        boost: f32,
    },
    MatchAll,
}

impl BackendQuery {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        BackendQuery::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        BackendQuery::Wildcard {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Combine clauses, collapsing a lone positive clause to itself
    ///
    /// Returns `None` when there is nothing to combine.
    pub fn combine(mut clauses: Vec<BooleanClause>) -> Option<BackendQuery> {
        match clauses.len() {
            0 => None,
            1 if clauses[0].occur != BoolOccur::MustNot => clauses.pop().map(|c| c.query),
            _ => Some(BackendQuery::Boolean { clauses }),
        }
    }

    /// Disjunction over queries
    pub fn any_of(queries: Vec<BackendQuery>) -> Option<BackendQuery> {
        Self::combine(
            queries
                .into_iter()
                .map(|q| BooleanClause::new(q, BoolOccur::Should))
                .collect(),
        )
    }

    pub fn with_boost(self, boost: Option<f32>) -> Self {
        match boost {
            Some(b) if (b - 1.0).abs() > f32::EPSILON => BackendQuery::Boost {
                query: Box::new(self),
                boost: b,
            },
            _ => self,
        }
    }

    /// The single field this query targets, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            BackendQuery::Term { field, .. }
            | BackendQuery::Wildcard { field, .. }
            | BackendQuery::Prefix { field, .. }
            | BackendQuery::Regexp { field, .. }
            | BackendQuery::Phrase { field, .. }
            | BackendQuery::Range { field, .. }
            | BackendQuery::Fuzzy { field, .. } => Some(field),
            BackendQuery::Boost { query, .. } => query.field(),
            BackendQuery::Span(_) | BackendQuery::Boolean { .. } | BackendQuery::MatchAll => None,
        }
    }

    /// Whether the textual form contains live wildcards
    pub fn has_wildcards(&self) -> bool {
        match self {
            BackendQuery::Wildcard { .. } | BackendQuery::Prefix { .. } => true,
            BackendQuery::Boost { query, .. } => query.has_wildcards(),
            BackendQuery::Boolean { clauses } => clauses.iter().any(|c| c.query.has_wildcards()),
            _ => false,
        }
    }

    fn is_compound(&self) -> bool {
        matches!(self, BackendQuery::Boolean { .. })
    }
}

impl fmt::Display for BackendQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendQuery::Term { field, value } => {
                write!(f, "{}:{}", escape_field(field), escape_value(value, false))
            }
            BackendQuery::Boolean { clauses } => {
                let rendered: Vec<String> = clauses
                    .iter()
                    .map(|c| {
                        if c.query.is_compound() {
                            format!("{}({})", c.occur.symbol(), c.query)
                        } else {
                            format!("{}{}", c.occur.symbol(), c.query)
                        }
                    })
                    .collect();
                write!(f, "{}", rendered.join(" "))
            }
            BackendQuery::Wildcard { field, pattern } => {
                write!(f, "{}:{}", escape_field(field), escape_value(pattern, true))
            }
            BackendQuery::Prefix { field, prefix } => {
                write!(f, "{}:{}*", escape_field(field), escape_value(prefix, false))
            }
            BackendQuery::Regexp { field, pattern } => {
                write!(f, "{}:/{}/", escape_field(field), pattern.replace('/', "\\/"))
            }
            BackendQuery::Span(span) => write!(f, "{}", span),
            BackendQuery::Phrase { field, terms, slop } => {
                let phrase: Vec<String> = terms.iter().map(|t| escape_phrase_term(t)).collect();
                write!(f, "{}:\"{}\"", escape_field(field), phrase.join(" "))?;
                if *slop > 0 {
                    write!(f, "~{}", slop)?;
                }
                Ok(())
            }
            BackendQuery::Range {
                field,
                lower,
                upper,
                include_lower,
                include_upper,
            } => write!(
                f,
                "{}:{}{} TO {}{}",
                escape_field(field),
                if *include_lower { '[' } else { '{' },
                lower.as_deref().map(range_bound).unwrap_or_else(|| "*".to_string()),
                upper.as_deref().map(range_bound).unwrap_or_else(|| "*".to_string()),
                if *include_upper { ']' } else { '}' },
            ),
            BackendQuery::Fuzzy {
                field,
                term,
                similarity,
            } => write!(
                f,
                "{}:{}~{}",
                escape_field(field),
                escape_value(term, false),
                similarity
            ),
            BackendQuery::Boost { query, boost } => {
                if query.is_compound() {
                    write!(f, "({})^{}", query, boost)
                } else {
                    write!(f, "{}^{}", query, boost)
                }
            }
            BackendQuery::MatchAll => write!(f, "*:*"),
        }
    }
}

impl fmt::Display for SpanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanQuery::Term { field, value } => write!(f, "{}:{}", field, value),
            SpanQuery::Near {
                clauses,
                slop,
                in_order,
            } => {
                let inner: Vec<String> = clauses.iter().map(|c| c.to_string()).collect();
                write!(f, "spanNear([{}], {}, {})", inner.join(", "), slop, in_order)
            }
            SpanQuery::First { inner, end } => write!(f, "spanFirst({}, {})", inner, end),
            SpanQuery::Or { clauses } => {
                let inner: Vec<String> = clauses.iter().map(|c| c.to_string()).collect();
                write!(f, "spanOr([{}])", inner.join(", "))
            }
            SpanQuery::FieldMasking { inner, field } => {
                write!(f, "mask({})as {}", inner, field)
            }
        }
    }
}

fn escape_phrase_term(term: &str) -> String {
    term.replace('\\', "\\\\").replace('"', "\\\"")
}

fn range_bound(value: &str) -> String {
    if value == "*" {
        return "\\*".to_string();
    }
    let escaped = escape_literal(value);
    if escaped.chars().any(char::is_whitespace) {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}
