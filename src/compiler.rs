//! Query compiler facade
//!
//! [`QueryCompiler`] owns the shared collaborators and configuration and
//! builds fresh request-scoped parser state for every call, so one instance
//! can serve concurrent requests.

use crate::backend::BackendQuery;
use crate::classic::{DefaultOperator, DispatchContext, FieldDispatchParser};
use crate::config::CompilerConfig;
use crate::dsl::{DslQuery, DslTranslator};
use crate::field::FieldResolver;
use crate::fts::{Constraint, ConstraintBuilder, FtsOptions};
use crate::model::{ContentModel, Dictionary, NamespaceResolver, SiteDirectory};
use crate::path::PathCompiler;
use crate::Result;
use std::sync::Arc;
use tracing::debug;

pub struct QueryCompiler {
    dictionary: Arc<dyn Dictionary>,
    namespaces: Arc<dyn NamespaceResolver>,
    sites: Arc<dyn SiteDirectory>,
    config: CompilerConfig,
    translator: DslTranslator,
}

impl QueryCompiler {
    pub fn new(
        dictionary: Arc<dyn Dictionary>,
        namespaces: Arc<dyn NamespaceResolver>,
        sites: Arc<dyn SiteDirectory>,
        config: CompilerConfig,
    ) -> Self {
        let translator = DslTranslator::new(config.wildcard_analysis_fields.iter().cloned());
        Self {
            dictionary,
            namespaces,
            sites,
            config,
            translator,
        }
    }

    /// A compiler backed by one in-memory content model
    pub fn from_model(model: ContentModel, config: CompilerConfig) -> Self {
        let model = Arc::new(model);
        Self::new(model.clone(), model.clone(), model, config)
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile an FTS expression into a constraint tree
    pub fn compile_fts(&self, query: &str, options: &FtsOptions) -> Result<Constraint> {
        debug!(query, mode = ?options.mode, phase = ?options.rerank_phase, "compiling FTS query");
        ConstraintBuilder::new(self.resolver()).build(query, options)
    }

    /// Compile a classic query with `OR` between juxtaposed clauses
    pub fn compile_classic(&self, query: &str) -> Result<Option<BackendQuery>> {
        self.compile_classic_with(query, DefaultOperator::Or)
    }

    /// Compile a classic query; `None` means every clause was dropped
    pub fn compile_classic_with(
        &self,
        query: &str,
        operator: DefaultOperator,
    ) -> Result<Option<BackendQuery>> {
        debug!(query, ?operator, "compiling classic query");
        FieldDispatchParser::new(self.dispatch_context())
            .with_default_operator(operator)
            .parse(query)
    }

    /// Compile a path expression, optionally against a field other than the
    /// configured path field
    pub fn compile_path(&self, path: &str, field: Option<&str>) -> Result<BackendQuery> {
        PathCompiler::new(self.namespaces.as_ref(), &self.config).compile_for_field(path, field)
    }

    /// Translate a backend query into the target DSL
    pub fn to_dsl(&self, query: &BackendQuery) -> Result<DslQuery> {
        self.translator.translate(query)
    }

    fn resolver(&self) -> FieldResolver<'_> {
        FieldResolver::new(
            self.dictionary.as_ref(),
            self.namespaces.as_ref(),
            &self.config,
        )
    }

    fn dispatch_context(&self) -> DispatchContext<'_> {
        DispatchContext {
            dictionary: self.dictionary.as_ref(),
            namespaces: self.namespaces.as_ref(),
            sites: self.sites.as_ref(),
            config: &self.config,
        }
    }
}
