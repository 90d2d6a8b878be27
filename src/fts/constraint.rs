//! Constraint tree produced from an FTS expression
//!
//! Every leaf carries a resolved [`FieldRef`]. Connectives with a single child
//! never appear; they collapse to the child.

use super::syntax::Prefix;
use crate::field::FieldRef;
use serde::Serialize;

/// How a constraint participates in its parent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    Mandatory,
    #[default]
    Default,
    Optional,
    Exclude,
}

impl From<Prefix> for Occur {
    fn from(prefix: Prefix) -> Self {
        match prefix {
            Prefix::Mandatory => Occur::Mandatory,
            Prefix::Default => Occur::Default,
            Prefix::Optional => Occur::Optional,
            Prefix::Exclude | Prefix::Negation => Occur::Exclude,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    Term {
        field: FieldRef,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        fuzzy: Option<f32>,
    },
    ExactTerm {
        field: FieldRef,
        text: String,
    },
    Phrase {
        field: FieldRef,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        slop: Option<u32>,
    },
    ExactPhrase {
        field: FieldRef,
        text: String,
    },
    Synonym {
        field: FieldRef,
        text: String,
    },
    Proximity {
        field: FieldRef,
        first: String,
        second: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        distance: Option<u32>,
    },
    /// Open bounds are `None`
    Range {
        field: FieldRef,
        lower: Option<String>,
        upper: Option<String>,
        include_lower: bool,
        include_upper: bool,
    },
    WildTerm {
        field: FieldRef,
        pattern: String,
    },
    PrefixTerm {
        field: FieldRef,
        prefix: String,
    },
    Conjunction {
        children: Vec<Constraint>,
    },
    Disjunction {
        children: Vec<Constraint>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Constraint {
    #[serde(flatten)]
    pub kind: ConstraintKind,
    pub occur: Occur,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

impl Constraint {
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            occur: Occur::Default,
            boost: None,
        }
    }

    /// Conjunction of `children`, or the only child itself
    pub fn all_of(children: Vec<Constraint>) -> Self {
        Self::connective(children, |children| ConstraintKind::Conjunction { children })
    }

    /// Disjunction of `children`, or the only child itself
    pub fn any_of(children: Vec<Constraint>) -> Self {
        Self::connective(children, |children| ConstraintKind::Disjunction { children })
    }

    fn connective(
        mut children: Vec<Constraint>,
        wrap: fn(Vec<Constraint>) -> ConstraintKind,
    ) -> Self {
        if children.len() == 1 {
            if let Some(only) = children.pop() {
                return only;
            }
        }
        Self::new(wrap(children))
    }

    pub fn with_occur(mut self, occur: Occur) -> Self {
        self.occur = occur;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    /// The field of a leaf constraint
    pub fn field(&self) -> Option<&FieldRef> {
        match &self.kind {
            ConstraintKind::Term { field, .. }
            | ConstraintKind::ExactTerm { field, .. }
            | ConstraintKind::Phrase { field, .. }
            | ConstraintKind::ExactPhrase { field, .. }
            | ConstraintKind::Synonym { field, .. }
            | ConstraintKind::Proximity { field, .. }
            | ConstraintKind::Range { field, .. }
            | ConstraintKind::WildTerm { field, .. }
            | ConstraintKind::PrefixTerm { field, .. } => Some(field),
            ConstraintKind::Conjunction { .. } | ConstraintKind::Disjunction { .. } => None,
        }
    }

    pub fn children(&self) -> &[Constraint] {
        match &self.kind {
            ConstraintKind::Conjunction { children } | ConstraintKind::Disjunction { children } => {
                children
            }
            _ => &[],
        }
    }

    /// Every leaf in left-to-right order
    pub fn leaves(&self) -> Vec<&Constraint> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'c>(&'c self, out: &mut Vec<&'c Constraint>) {
        if self.field().is_some() {
            out.push(self);
        }
        for child in self.children() {
            child.collect_leaves(out);
        }
    }
}
