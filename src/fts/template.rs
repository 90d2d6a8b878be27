//! Field templates
//!
//! A template is an FTS expression registered under a field name. A query
//! against that field is answered by the template, with each `%field`
//! placeholder replaced by the original test aimed at `field`, and each
//! `%(a b)` placeholder by a disjunction of copies aimed at `a` and `b`.

use super::parser::FtsParser;
use super::syntax::{Clause, QueryMode, SyntaxNode, Test};
use crate::error::CompileError;
use crate::Result;
use std::collections::HashMap;
use tracing::debug;

/// Templates keyed by lower-cased field name
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, SyntaxNode>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(field, template)` pairs
    pub fn from_map<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut registry = Self::new();
        for (field, template) in entries {
            registry.register(field.as_ref(), template.as_ref())?;
        }
        Ok(registry)
    }

    /// Parse and register a template for `field`
    pub fn register(&mut self, field: &str, template: &str) -> Result<()> {
        let key = field.to_lowercase();
        if self.templates.contains_key(&key) {
            return Err(CompileError::DuplicateTemplate(field.to_string()));
        }

        let node = FtsParser::new(template, QueryMode::DefaultConjunction)?.parse()?;
        if !has_placeholder(&node) {
            return Err(CompileError::Config(format!(
                "template for '{}' has no placeholder",
                field
            )));
        }

        debug!(field = %key, template, "registered field template");
        self.templates.insert(key, node);
        Ok(())
    }

    pub fn with_template(mut self, field: &str, template: &str) -> Result<Self> {
        self.register(field, template)?;
        Ok(self)
    }

    /// The template registered for `field`, ignoring case
    pub fn get(&self, field: &str) -> Option<&SyntaxNode> {
        self.templates.get(&field.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Copy `template`, replacing every placeholder with `leaf` retargeted
pub fn instantiate(template: &SyntaxNode, leaf: &Test) -> Result<SyntaxNode> {
    match template {
        SyntaxNode::Disjunction(children) => Ok(SyntaxNode::Disjunction(
            children
                .iter()
                .map(|c| instantiate(c, leaf))
                .collect::<Result<_>>()?,
        )),
        SyntaxNode::Conjunction(children) => Ok(SyntaxNode::Conjunction(
            children
                .iter()
                .map(|c| instantiate(c, leaf))
                .collect::<Result<_>>()?,
        )),
        SyntaxNode::Clause(clause) => {
            let test = match &clause.test {
                Test::Placeholder { fields } => substitute(fields, leaf)?,
                Test::Group(body) => Test::Group(Box::new(instantiate(body, leaf)?)),
                Test::FieldGroup { field, body } => Test::FieldGroup {
                    field: field.clone(),
                    body: Box::new(instantiate(body, leaf)?),
                },
                other => other.clone(),
            };
            Ok(SyntaxNode::Clause(Clause {
                prefix: clause.prefix,
                test,
                boost: clause.boost,
            }))
        }
    }
}

fn substitute(fields: &[String], leaf: &Test) -> Result<Test> {
    let mut copies = fields
        .iter()
        .map(|field| {
            leaf.retarget(field).ok_or_else(|| {
                CompileError::Internal("template applied to a non-leaf test".to_string())
            })
        })
        .collect::<Result<Vec<Test>>>()?;

    if copies.len() == 1 {
        if let Some(only) = copies.pop() {
            return Ok(only);
        }
    }
    let branches = copies
        .into_iter()
        .map(|test| SyntaxNode::Clause(Clause::new(test)))
        .collect();
    Ok(Test::Group(Box::new(SyntaxNode::Disjunction(branches))))
}

fn has_placeholder(node: &SyntaxNode) -> bool {
    match node {
        SyntaxNode::Disjunction(children) | SyntaxNode::Conjunction(children) => {
            children.iter().any(has_placeholder)
        }
        SyntaxNode::Clause(clause) => match &clause.test {
            Test::Placeholder { .. } => true,
            Test::Group(body) | Test::FieldGroup { body, .. } => has_placeholder(body),
            _ => false,
        },
    }
}
