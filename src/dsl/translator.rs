//! Translation of backend query objects into the target DSL

use super::target::DslQuery;
use crate::backend::{BackendQuery, BoolOccur, SpanQuery, WILDCARD_TOKEN};
use crate::error::CompileError;
use crate::Result;
use std::collections::BTreeSet;
use tracing::debug;

/// Recursive, stateless translator from [`BackendQuery`] to [`DslQuery`]
#[derive(Clone, Debug, Default)]
pub struct DslTranslator {
    /// Fields whose free-text fallback asks the engine to analyze wildcards
    wildcard_fields: BTreeSet<String>,
}

impl DslTranslator {
    pub fn new<I, S>(wildcard_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wildcard_fields: wildcard_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn translate(&self, query: &BackendQuery) -> Result<DslQuery> {
        match query {
            BackendQuery::Boolean { clauses } => {
                let mut must = Vec::new();
                let mut filter = Vec::new();
                let mut should = Vec::new();
                let mut must_not = Vec::new();
                for clause in clauses {
                    let translated = self.translate(&clause.query)?;
                    match clause.occur {
                        BoolOccur::Must => must.push(translated),
                        BoolOccur::Filter => filter.push(translated),
                        BoolOccur::Should => should.push(translated),
                        BoolOccur::MustNot => must_not.push(translated),
                    }
                }
                Ok(DslQuery::Bool {
                    must,
                    filter,
                    should,
                    must_not,
                    boost: None,
                })
            }
            BackendQuery::Span(span) => self.translate_span(span),
            BackendQuery::Prefix { field, prefix } => Ok(DslQuery::Prefix {
                field: field.clone(),
                value: prefix.clone(),
            }),
            BackendQuery::Wildcard { field, pattern } => Ok(DslQuery::Wildcard {
                field: field.clone(),
                value: pattern.clone(),
            }),
            BackendQuery::Regexp { field, pattern } => Ok(DslQuery::Regexp {
                field: field.clone(),
                value: pattern.clone(),
            }),
            BackendQuery::Boost { query: inner, .. } if has_text_form(inner) => {
                self.query_string(query)
            }
            BackendQuery::Boost { query: inner, boost } => {
                Ok(self.translate(inner)?.boosted(*boost))
            }
            BackendQuery::Term { .. }
            | BackendQuery::Phrase { .. }
            | BackendQuery::Range { .. }
            | BackendQuery::Fuzzy { .. }
            | BackendQuery::MatchAll => self.query_string(query),
        }
    }

    fn translate_span(&self, span: &SpanQuery) -> Result<DslQuery> {
        match span {
            SpanQuery::Term { field, value } if value == WILDCARD_TOKEN => Ok(DslQuery::SpanMulti {
                inner: Box::new(DslQuery::Wildcard {
                    field: field.clone(),
                    value: value.clone(),
                }),
            }),
            SpanQuery::Term { field, value } => Ok(DslQuery::SpanTerm {
                field: field.clone(),
                value: value.clone(),
            }),
            SpanQuery::Near {
                clauses,
                slop,
                in_order,
            } => Ok(DslQuery::SpanNear {
                clauses: self.translate_spans(clauses)?,
                slop: *slop,
                in_order: *in_order,
            }),
            SpanQuery::First { inner, end } => Ok(DslQuery::SpanFirst {
                inner: Box::new(self.translate_span(inner)?),
                end: *end,
            }),
            SpanQuery::Or { clauses } => Ok(DslQuery::SpanOr {
                clauses: self.translate_spans(clauses)?,
            }),
            SpanQuery::FieldMasking { field, .. } => Err(CompileError::Unsupported(format!(
                "field masking span query (masked as '{}')",
                field
            ))),
        }
    }

    fn translate_spans(&self, spans: &[SpanQuery]) -> Result<Vec<DslQuery>> {
        spans.iter().map(|s| self.translate_span(s)).collect()
    }

    /// Fall back to the textual form
    fn query_string(&self, query: &BackendQuery) -> Result<DslQuery> {
        let analyze_wildcard = query.has_wildcards()
            && query
                .field()
                .is_some_and(|field| self.wildcard_fields.contains(field));
        let text = query.to_string();
        debug!(query = %text, analyze_wildcard, "falling back to query string");
        Ok(DslQuery::QueryString {
            query: text,
            analyze_wildcard,
        })
    }
}

/// Leaf queries whose boosted textual form the engine parses as-is
fn has_text_form(query: &BackendQuery) -> bool {
    matches!(
        query,
        BackendQuery::Term { .. }
            | BackendQuery::Phrase { .. }
            | BackendQuery::Range { .. }
            | BackendQuery::Fuzzy { .. }
            | BackendQuery::Wildcard { .. }
            | BackendQuery::Prefix { .. }
            | BackendQuery::MatchAll
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BooleanClause;

    fn translator() -> DslTranslator {
        DslTranslator::new(["cm:name"])
    }

    #[test]
    fn test_boolean_keeps_occurs_and_order() {
        let query = BackendQuery::Boolean {
            clauses: vec![
                BooleanClause::new(BackendQuery::wildcard("cm:name", "a*"), BoolOccur::Must),
                BooleanClause::new(BackendQuery::wildcard("cm:name", "b*"), BoolOccur::Must),
                BooleanClause::new(BackendQuery::wildcard("cm:name", "c*"), BoolOccur::MustNot),
                BooleanClause::new(BackendQuery::wildcard("cm:name", "d*"), BoolOccur::Filter),
            ],
        };
        let DslQuery::Bool {
            must,
            filter,
            should,
            must_not,
            boost,
        } = translator().translate(&query).unwrap()
        else {
            panic!("expected bool");
        };
        assert_eq!(must.len(), 2);
        assert!(matches!(&must[1], DslQuery::Wildcard { value, .. } if value == "b*"));
        assert_eq!(filter.len(), 1);
        assert!(should.is_empty());
        assert_eq!(must_not.len(), 1);
        assert_eq!(boost, None);
    }

    #[test]
    fn test_boosted_span_stays_structured() {
        let span = SpanQuery::first(SpanQuery::term("PATH", "/"), 1);
        let boosted = BackendQuery::Span(span).with_boost(Some(2.0));
        let DslQuery::Bool { must, boost, .. } = translator().translate(&boosted).unwrap() else {
            panic!("expected bool");
        };
        assert_eq!(boost, Some(2.0));
        assert!(matches!(must[0], DslQuery::SpanFirst { end: 1, .. }));
    }

    #[test]
    fn test_boosted_boolean_takes_the_boost() {
        let group = BackendQuery::Boolean {
            clauses: vec![
                BooleanClause::new(
                    BackendQuery::Span(SpanQuery::term("PATH", "a")),
                    BoolOccur::Should,
                ),
                BooleanClause::new(BackendQuery::term("ID", "1"), BoolOccur::Should),
            ],
        }
        .with_boost(Some(2.0));
        let DslQuery::Bool { should, boost, .. } = translator().translate(&group).unwrap() else {
            panic!("expected bool");
        };
        assert_eq!(boost, Some(2.0));
        assert!(matches!(should[0], DslQuery::SpanTerm { .. }));
        assert!(matches!(should[1], DslQuery::QueryString { .. }));
    }

    #[test]
    fn test_span_translation() {
        let span = SpanQuery::first(
            SpanQuery::near(
                vec![SpanQuery::term("PATH", "a"), SpanQuery::term("PATH", "*")],
                0,
                true,
            ),
            2,
        );
        let translated = translator().translate(&BackendQuery::Span(span)).unwrap();
        let DslQuery::SpanFirst { inner, end } = translated else {
            panic!("expected span_first");
        };
        assert_eq!(end, 2);
        let DslQuery::SpanNear { clauses, .. } = *inner else {
            panic!("expected span_near");
        };
        assert!(matches!(clauses[0], DslQuery::SpanTerm { .. }));
        assert!(matches!(clauses[1], DslQuery::SpanMulti { .. }));
    }

    #[test]
    fn test_field_masking_unsupported() {
        let masked = SpanQuery::FieldMasking {
            inner: Box::new(SpanQuery::term("PATH", "a")),
            field: "OTHER".to_string(),
        };
        let err = translator()
            .translate(&BackendQuery::Span(SpanQuery::Or {
                clauses: vec![masked.clone()],
            }))
            .unwrap_err();
        assert!(matches!(err, CompileError::Unsupported(_)));

        let boosted = BackendQuery::Span(masked).with_boost(Some(2.0));
        assert!(translator().translate(&boosted).is_err());
    }

    #[test]
    fn test_query_string_fallback() {
        let translated = translator()
            .translate(&BackendQuery::term("cm:name", "AND"))
            .unwrap();
        assert_eq!(
            translated,
            DslQuery::QueryString {
                query: r"cm\:name:\A\N\D".to_string(),
                analyze_wildcard: false,
            }
        );

        let boosted = BackendQuery::wildcard("cm:name", "rep*").with_boost(Some(2.0));
        assert!(matches!(
            translator().translate(&boosted).unwrap(),
            DslQuery::QueryString { analyze_wildcard: true, .. }
        ));

        let other = BackendQuery::wildcard("cm:title", "rep*").with_boost(Some(2.0));
        assert!(matches!(
            translator().translate(&other).unwrap(),
            DslQuery::QueryString { analyze_wildcard: false, .. }
        ));

        assert_eq!(
            translator().translate(&BackendQuery::MatchAll).unwrap(),
            DslQuery::QueryString {
                query: "*:*".to_string(),
                analyze_wildcard: false,
            }
        );
    }
}
