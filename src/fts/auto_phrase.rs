//! Auto-phrase rewrite
//!
//! A conjunction of plain words such as `big brown dog` is also matched as
//! the phrase `"big brown dog"`, so documents holding the words together rank
//! first. In the single-pass phase the conjunction is kept next to the phrase;
//! in the rerank phase only the phrase remains.

use super::syntax::{Clause, Prefix, RerankPhase, SyntaxNode, Test};
use crate::classic::escape::has_unescaped_wildcard;

/// Apply the rewrite for `phase`; other phases get the tree back unchanged
pub fn rewrite(node: SyntaxNode, phase: RerankPhase, default_field: &str) -> SyntaxNode {
    if !phase.auto_phrase() {
        return node;
    }
    rewrite_node(node, phase.keeps_conjunction(), default_field)
}

fn rewrite_node(node: SyntaxNode, keep_conjunction: bool, default_field: &str) -> SyntaxNode {
    match node {
        SyntaxNode::Conjunction(children) => match phrase_text(&children, default_field) {
            Some(text) => {
                let phrase = SyntaxNode::Clause(Clause::new(Test::Phrase {
                    field: None,
                    text,
                    slop: None,
                }));
                if keep_conjunction {
                    SyntaxNode::Disjunction(vec![SyntaxNode::Conjunction(children), phrase])
                } else {
                    phrase
                }
            }
            None => SyntaxNode::Conjunction(
                children
                    .into_iter()
                    .map(|c| rewrite_node(c, keep_conjunction, default_field))
                    .collect(),
            ),
        },
        SyntaxNode::Disjunction(children) => SyntaxNode::Disjunction(
            children
                .into_iter()
                .map(|c| rewrite_node(c, keep_conjunction, default_field))
                .collect(),
        ),
        SyntaxNode::Clause(mut clause) => {
            clause.test = match clause.test {
                Test::Group(body) => {
                    Test::Group(Box::new(rewrite_node(*body, keep_conjunction, default_field)))
                }
                Test::FieldGroup { field, body } => Test::FieldGroup {
                    field,
                    body: Box::new(rewrite_node(*body, keep_conjunction, default_field)),
                },
                other => other,
            };
            SyntaxNode::Clause(clause)
        }
    }
}

/// The phrase text of a qualifying conjunction
fn phrase_text(children: &[SyntaxNode], default_field: &str) -> Option<String> {
    if children.len() < 2 {
        return None;
    }
    let words = children
        .iter()
        .map(|child| match child {
            SyntaxNode::Clause(clause) => plain_word(clause, default_field),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;
    Some(words.join(" "))
}

fn plain_word<'c>(clause: &'c Clause, default_field: &str) -> Option<&'c str> {
    if !matches!(clause.prefix, Prefix::Default | Prefix::Mandatory) || clause.boost.is_some() {
        return None;
    }
    match &clause.test {
        Test::Term {
            field,
            text,
            fuzzy: None,
        } if field.as_deref().map_or(true, |f| f == default_field)
            && !has_unescaped_wildcard(text) =>
        {
            Some(text.as_str())
        }
        _ => None,
    }
}
