pub mod backend;
pub mod classic;
pub mod compiler;
pub mod config;
pub mod dsl;
pub mod error;
pub mod field;
pub mod fts;
pub mod model;
pub mod path;
pub mod text;

pub use backend::{BackendQuery, BoolOccur, BooleanClause, SpanQuery};
pub use classic::{DefaultOperator, FieldDispatchParser};
pub use compiler::QueryCompiler;
pub use config::{CompilerConfig, PathStrategy};
pub use dsl::{DslQuery, DslTranslator};
pub use error::{CompileError, Result};
pub use field::{FieldRef, MatchMode};
pub use fts::{Constraint, ConstraintKind, FtsOptions, Occur, QueryMode, RerankPhase, TemplateRegistry};
pub use model::{ContentModel, ContentModelSpec, Dictionary, NamespaceResolver, SiteDirectory};
pub use path::PathCompiler;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
