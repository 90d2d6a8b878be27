//! Path query compilation
//!
//! Absolute paths compile to positional span queries over the path field;
//! relative paths, or every path under [`PathStrategy::Regex`], compile to a
//! regular expression over the raw path field.

pub mod grammar;
pub mod positional;
pub mod regex;

pub use self::grammar::{parse_path, PathHandler};
pub use self::positional::{PositionalPathBuilder, DESCENDANT_SLOP, PATH_END_MARKER};
pub use self::regex::compile_path_regex;

use crate::backend::BackendQuery;
use crate::config::{CompilerConfig, PathStrategy};
use crate::model::NamespaceResolver;
use crate::Result;
use tracing::debug;

/// Compiles paths according to the configured strategy
pub struct PathCompiler<'a> {
    namespaces: &'a dyn NamespaceResolver,
    config: &'a CompilerConfig,
}

impl<'a> PathCompiler<'a> {
    pub fn new(namespaces: &'a dyn NamespaceResolver, config: &'a CompilerConfig) -> Self {
        Self { namespaces, config }
    }

    /// Compile against the configured path fields
    pub fn compile(&self, expr: &str) -> Result<BackendQuery> {
        self.compile_for_field(expr, None)
    }

    /// Compile against `field`, or the configured field for the chosen strategy
    pub fn compile_for_field(&self, expr: &str, field: Option<&str>) -> Result<BackendQuery> {
        let absolute = expr.trim_start().starts_with('/');
        if absolute && self.config.path_strategy == PathStrategy::Positional {
            let field = field.unwrap_or(&self.config.path_field);
            debug!(path = %expr, field = %field, "compiling positional path");
            let span = PositionalPathBuilder::compile(expr, field, self.namespaces)?;
            return Ok(BackendQuery::Span(span));
        }

        let field = field.unwrap_or(&self.config.path_regex_field);
        debug!(path = %expr, field = %field, "compiling path regex");
        Ok(BackendQuery::Regexp {
            field: field.to_string(),
            pattern: compile_path_regex(expr)?,
        })
    }
}
