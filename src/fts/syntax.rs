//! Syntax tree for FTS expressions
//!
//! Leaf text is kept raw (escapes intact) so later passes can still tell an
//! escaped `\*` from a live wildcard.

use serde::{Deserialize, Serialize};

/// Operator written in front of a clause
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Prefix {
    /// `+`
    Mandatory,
    #[default]
    Default,
    /// `|`
    Optional,
    /// `-`
    Exclude,
    /// `!` or `NOT`
    Negation,
}

/// How juxtaposed clauses combine, and which syntax is accepted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// CMIS `contains()`: terms, phrases, `-` and `OR` only
    Cmis,
    #[default]
    DefaultConjunction,
    DefaultDisjunction,
}

/// Connective used between juxtaposed clauses inside a field group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
    #[default]
    And,
    Or,
}

/// Ranking pass a query is compiled for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankPhase {
    /// One pass, no auto-phrase
    #[default]
    SinglePass,
    /// One pass; word conjunctions also match as a phrase
    SinglePassWithAutoPhrase,
    /// First pass of a two-pass ranking
    QueryPhase,
    /// Second pass; word conjunctions match as a phrase only
    Rerank,
}

impl RerankPhase {
    pub fn auto_phrase(&self) -> bool {
        matches!(self, RerankPhase::SinglePassWithAutoPhrase | RerankPhase::Rerank)
    }

    /// Whether the auto-phrase rewrite keeps the original conjunction
    pub fn keeps_conjunction(&self) -> bool {
        matches!(self, RerankPhase::SinglePassWithAutoPhrase)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SyntaxNode {
    Disjunction(Vec<SyntaxNode>),
    Conjunction(Vec<SyntaxNode>),
    Clause(Clause),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Clause {
    pub prefix: Prefix,
    pub test: Test,
    pub boost: Option<f32>,
}

impl Clause {
    pub fn new(test: Test) -> Self {
        Self {
            prefix: Prefix::Default,
            test,
            boost: None,
        }
    }
}

/// What a clause tests
#[derive(Clone, Debug, PartialEq)]
pub enum Test {
    Term {
        field: Option<String>,
        text: String,
        fuzzy: Option<f32>,
    },
    /// `=term`
    ExactTerm {
        field: Option<String>,
        text: String,
    },
    Phrase {
        field: Option<String>,
        text: String,
        slop: Option<u32>,
    },
    /// `="phrase"`
    ExactPhrase {
        field: Option<String>,
        text: String,
    },
    /// `~term`
    Synonym {
        field: Option<String>,
        text: String,
    },
    /// `first *(distance) second`
    Proximity {
        field: Option<String>,
        first: String,
        second: String,
        distance: Option<u32>,
    },
    Range {
        field: Option<String>,
        lower: String,
        upper: String,
        include_lower: bool,
        include_upper: bool,
    },
    /// Template marker: `%field` or `%(a b)`
    Placeholder { fields: Vec<String> },
    /// Parenthesized sub-expression
    Group(Box<SyntaxNode>),
    /// `field:( ... )`
    FieldGroup { field: String, body: Box<SyntaxNode> },
}

impl Test {
    /// The explicit field of a leaf test
    pub fn field(&self) -> Option<&str> {
        match self {
            Test::Term { field, .. }
            | Test::ExactTerm { field, .. }
            | Test::Phrase { field, .. }
            | Test::ExactPhrase { field, .. }
            | Test::Synonym { field, .. }
            | Test::Proximity { field, .. }
            | Test::Range { field, .. } => field.as_deref(),
            Test::FieldGroup { field, .. } => Some(field),
            Test::Placeholder { .. } | Test::Group(_) => None,
        }
    }

    /// A copy of a leaf test aimed at another field
    ///
    /// Returns `None` for tests that are not leaves.
    pub fn retarget(&self, target: &str) -> Option<Test> {
        let mut copy = self.clone();
        match &mut copy {
            Test::Term { field, .. }
            | Test::ExactTerm { field, .. }
            | Test::Phrase { field, .. }
            | Test::ExactPhrase { field, .. }
            | Test::Synonym { field, .. }
            | Test::Proximity { field, .. }
            | Test::Range { field, .. } => *field = Some(target.to_string()),
            Test::Placeholder { .. } | Test::Group(_) | Test::FieldGroup { .. } => return None,
        }
        Some(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retarget_leaf() {
        let test = Test::Term {
            field: None,
            text: "1000".to_string(),
            fuzzy: None,
        };
        let moved = test.retarget("content.size").unwrap();
        assert_eq!(moved.field(), Some("content.size"));
        assert_eq!(test.field(), None);
    }

    #[test]
    fn test_retarget_rejects_groups() {
        let group = Test::Group(Box::new(SyntaxNode::Conjunction(vec![])));
        assert!(group.retarget("x").is_none());
        assert!(Test::Placeholder { fields: vec!["a".to_string()] }
            .retarget("x")
            .is_none());
    }

    #[test]
    fn test_phase_flags() {
        assert!(!RerankPhase::SinglePass.auto_phrase());
        assert!(!RerankPhase::QueryPhase.auto_phrase());
        assert!(RerankPhase::Rerank.auto_phrase());
        assert!(RerankPhase::SinglePassWithAutoPhrase.keeps_conjunction());
        assert!(!RerankPhase::Rerank.keeps_conjunction());
    }
}
