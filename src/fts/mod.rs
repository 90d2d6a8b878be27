//! FTS expression language
//!
//! This module provides:
//! - A lexer and recursive-descent parser producing [`SyntaxNode`] trees
//! - The auto-phrase rewrite applied for ranking phases that ask for it
//! - Field templates
//! - [`ConstraintBuilder`], which lowers syntax trees into [`Constraint`] trees

pub mod auto_phrase;
pub mod builder;
pub mod constraint;
pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod template;

pub use builder::{ConstraintBuilder, FtsOptions};
pub use constraint::{Constraint, ConstraintKind, Occur};
pub use parser::FtsParser;
pub use syntax::{Clause, Connective, Prefix, QueryMode, RerankPhase, SyntaxNode, Test};
pub use template::TemplateRegistry;
