//! Target query DSL
//!
//! A JSON query document in the style of Elasticsearch/OpenSearch. Each
//! variant serializes to the object the engine expects, keyed by query type.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum DslQuery {
    Bool {
        must: Vec<DslQuery>,
        filter: Vec<DslQuery>,
        should: Vec<DslQuery>,
        must_not: Vec<DslQuery>,
        boost: Option<f32>,
    },
    SpanTerm {
        field: String,
        value: String,
    },
    SpanNear {
        clauses: Vec<DslQuery>,
        slop: u32,
        in_order: bool,
    },
    SpanFirst {
        inner: Box<DslQuery>,
        end: u32,
    },
    SpanOr {
        clauses: Vec<DslQuery>,
    },
    /// Multi-term query usable as a span
    SpanMulti {
        inner: Box<DslQuery>,
    },
    Prefix {
        field: String,
        value: String,
    },
    Wildcard {
        field: String,
        value: String,
    },
    Regexp {
        field: String,
        value: String,
    },
    /// Free text in the engine's query syntax
    QueryString {
        query: String,
        analyze_wildcard: bool,
    },
}

impl DslQuery {
    /// Carry `boost` on this query, wrapping it in a `bool` when it has no
    /// boost slot of its own
    pub fn boosted(self, boost: f32) -> DslQuery {
        match self {
            DslQuery::Bool {
                must,
                filter,
                should,
                must_not,
                boost: None,
            } => DslQuery::Bool {
                must,
                filter,
                should,
                must_not,
                boost: Some(boost),
            },
            other => DslQuery::Bool {
                must: vec![other],
                filter: Vec::new(),
                should: Vec::new(),
                must_not: Vec::new(),
                boost: Some(boost),
            },
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            DslQuery::Bool {
                must,
                filter,
                should,
                must_not,
                boost,
            } => {
                let mut body = Map::new();
                for (key, clauses) in [
                    ("must", must),
                    ("filter", filter),
                    ("should", should),
                    ("must_not", must_not),
                ] {
                    if !clauses.is_empty() {
                        body.insert(key.to_string(), array(clauses));
                    }
                }
                if let Some(boost) = boost {
                    body.insert("boost".to_string(), json!(boost));
                }
                json!({ "bool": body })
            }
            DslQuery::SpanTerm { field, value } => json!({ "span_term": field_value(field, value) }),
            DslQuery::SpanNear {
                clauses,
                slop,
                in_order,
            } => json!({
                "span_near": {
                    "clauses": array(clauses),
                    "slop": slop,
                    "in_order": in_order,
                }
            }),
            DslQuery::SpanFirst { inner, end } => json!({
                "span_first": { "match": inner.to_json(), "end": end }
            }),
            DslQuery::SpanOr { clauses } => json!({ "span_or": { "clauses": array(clauses) } }),
            DslQuery::SpanMulti { inner } => json!({ "span_multi": { "match": inner.to_json() } }),
            DslQuery::Prefix { field, value } => json!({ "prefix": field_value(field, value) }),
            DslQuery::Wildcard { field, value } => json!({ "wildcard": field_value(field, value) }),
            DslQuery::Regexp { field, value } => json!({ "regexp": field_value(field, value) }),
            DslQuery::QueryString {
                query,
                analyze_wildcard,
            } => {
                let mut body = json!({ "query": query });
                if *analyze_wildcard {
                    body["analyze_wildcard"] = Value::Bool(true);
                }
                json!({ "query_string": body })
            }
        }
    }
}

impl Serialize for DslQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn array(queries: &[DslQuery]) -> Value {
    Value::Array(queries.iter().map(DslQuery::to_json).collect())
}

fn field_value(field: &str, value: &str) -> Value {
    let mut body = Map::new();
    body.insert(field.to_string(), json!({ "value": value }));
    Value::Object(body)
}
