//! Positional span compilation of absolute paths
//!
//! Every path element is indexed as two tokens, namespace then local name,
//! followed by an end marker after the last element. A chain of child steps
//! is therefore an ordered, zero-slop run of tokens; a `//` breaks the chain
//! into runs that only need to occur in the same field, far enough apart.
//!
//! ```text
//! /cm:a/cm:b//cm:c
//!
//! spanNear([
//!     spanFirst(spanNear([{cm}, a, {cm}, b], 0, true), 4),
//!     spanNear([{cm}, c, /], 0, true),
//! ], 100000, false)
//! ```

use super::grammar::{parse_path, PathHandler};
use crate::backend::{SpanQuery, WILDCARD_TOKEN};
use crate::error::CompileError;
use crate::model::NamespaceResolver;
use crate::text;
use crate::Result;

/// Token closing every indexed path
pub const PATH_END_MARKER: &str = "/";

/// Slop between runs separated by a descendant step
pub const DESCENDANT_SLOP: u32 = 100_000;

/// Builds a span query from path grammar events
pub struct PositionalPathBuilder<'a> {
    field: String,
    namespaces: &'a dyn NamespaceResolver,
    open_run: Vec<SpanQuery>,
    runs: Vec<SpanQuery>,
    /// Whether the next closed run starts at the root
    at_root: bool,
}

impl<'a> PositionalPathBuilder<'a> {
    pub fn new(field: impl Into<String>, namespaces: &'a dyn NamespaceResolver) -> Self {
        Self {
            field: field.into(),
            namespaces,
            open_run: Vec::new(),
            runs: Vec::new(),
            at_root: true,
        }
    }

    /// Compile `expr` in one go
    pub fn compile(
        expr: &str,
        field: impl Into<String>,
        namespaces: &'a dyn NamespaceResolver,
    ) -> Result<SpanQuery> {
        let mut builder = Self::new(field, namespaces);
        parse_path(expr, &mut builder)?;
        builder.finish()
    }

    /// Fold the closed runs into the final query
    pub fn finish(mut self) -> Result<SpanQuery> {
        let mut acc = self
            .runs
            .pop()
            .ok_or_else(|| CompileError::Internal("path compiled to no runs".to_string()))?;
        while let Some(run) = self.runs.pop() {
            acc = SpanQuery::near(vec![run, acc], DESCENDANT_SLOP, false);
        }
        Ok(acc)
    }

    fn term(&self, value: impl Into<String>) -> SpanQuery {
        SpanQuery::term(self.field.clone(), value)
    }

    fn close_run(&mut self, terminal: bool) {
        if terminal {
            let marker = self.term(PATH_END_MARKER);
            self.open_run.push(marker);
        }
        if self.open_run.is_empty() {
            self.at_root = false;
            return;
        }

        let mut clauses = std::mem::take(&mut self.open_run);
        let len = clauses.len() as u32;
        let mut run = if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            SpanQuery::near(clauses, 0, true)
        };
        if self.at_root {
            run = SpanQuery::first(run, len);
        }
        self.at_root = false;
        self.runs.push(run);
    }

    fn namespace_token(&self, prefix: Option<&str>) -> Result<String> {
        match prefix {
            None | Some("*") => Ok(WILDCARD_TOKEN.to_string()),
            Some(p) if p.starts_with('{') && p.ends_with('}') => Ok(p[1..p.len() - 1].to_string()),
            Some(p) => self
                .namespaces
                .namespace_uri(p)
                .ok_or_else(|| CompileError::UnknownPrefix(p.to_string())),
        }
    }
}

impl PathHandler for PositionalPathBuilder<'_> {
    fn start_path(&mut self, absolute: bool) -> Result<()> {
        if !absolute {
            return Err(CompileError::Unsupported(
                "relative path in a positional path query".to_string(),
            ));
        }
        Ok(())
    }

    fn child_step(&mut self, prefix: Option<&str>, local_name: Option<&str>) -> Result<()> {
        let namespace = self.namespace_token(prefix)?;
        let local = match local_name {
            Some(name) => text::iso9075_decode(name),
            None => WILDCARD_TOKEN.to_string(),
        };
        let namespace = self.term(namespace);
        let local = self.term(local);
        self.open_run.push(namespace);
        self.open_run.push(local);
        Ok(())
    }

    fn descendant(&mut self) -> Result<()> {
        self.close_run(false);
        Ok(())
    }

    fn end_path(&mut self) -> Result<()> {
        self.close_run(true);
        Ok(())
    }
}
