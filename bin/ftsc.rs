use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fts_compiler::fts::Connective;
use fts_compiler::{
    BackendQuery, CompilerConfig, ContentModel, DefaultOperator, FtsOptions, QueryCompiler,
    QueryMode, RerankPhase, TemplateRegistry,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ftsc")]
#[command(about = "Compile FTS, classic and path queries to a search-engine query DSL", long_about = None)]
struct Args {
    /// Content model JSON file (built-in namespaces only when omitted)
    #[arg(long, env = "FTSC_MODEL", global = true)]
    model: Option<PathBuf>,

    /// Compiler configuration JSON file
    #[arg(long, env = "FTSC_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile an FTS expression to a constraint tree
    Fts {
        query: String,

        #[arg(long, value_enum, default_value = "conjunction")]
        mode: ModeArg,

        #[arg(long, value_enum, default_value = "single-pass")]
        phase: PhaseArg,

        /// Field for terms with no field of their own
        #[arg(long)]
        default_field: Option<String>,

        /// Join juxtaposed clauses inside field groups with OR
        #[arg(long)]
        field_or: bool,

        /// Field template, repeatable
        #[arg(long = "template", value_name = "FIELD=TEMPLATE")]
        templates: Vec<String>,
    },

    /// Compile a classic `field:value` query
    Classic {
        query: String,

        /// Join juxtaposed clauses with AND instead of OR
        #[arg(long)]
        and: bool,

        /// Print the backend query instead of the DSL document
        #[arg(long)]
        backend: bool,
    },

    /// Compile a path expression
    Path {
        path: String,

        /// Index field to query instead of the configured path field
        #[arg(long)]
        field: Option<String>,

        /// Print the backend query instead of the DSL document
        #[arg(long)]
        backend: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Cmis,
    Conjunction,
    Disjunction,
}

impl From<ModeArg> for QueryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Cmis => QueryMode::Cmis,
            ModeArg::Conjunction => QueryMode::DefaultConjunction,
            ModeArg::Disjunction => QueryMode::DefaultDisjunction,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PhaseArg {
    SinglePass,
    AutoPhrase,
    QueryPhase,
    Rerank,
}

impl From<PhaseArg> for RerankPhase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::SinglePass => RerankPhase::SinglePass,
            PhaseArg::AutoPhrase => RerankPhase::SinglePassWithAutoPhrase,
            PhaseArg::QueryPhase => RerankPhase::QueryPhase,
            PhaseArg::Rerank => RerankPhase::Rerank,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let model = match &args.model {
        Some(path) => ContentModel::from_json_file(path)
            .with_context(|| format!("loading content model from {}", path.display()))?,
        None => ContentModel::empty(),
    };
    let config = match &args.config {
        Some(path) => CompilerConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => CompilerConfig::default(),
    };
    debug!(?config, "configuration loaded");

    let compiler = QueryCompiler::from_model(model, config);

    let output = match args.command {
        Command::Fts {
            query,
            mode,
            phase,
            default_field,
            field_or,
            templates,
        } => {
            let mut options = FtsOptions::new()
                .with_mode(mode.into())
                .with_rerank_phase(phase.into())
                .with_templates(parse_templates(&templates)?)
                .with_default_connective(if field_or { Connective::Or } else { Connective::And });
            if let Some(field) = default_field {
                options = options.with_default_field(field);
            }
            serde_json::to_value(compiler.compile_fts(&query, &options)?)?
        }
        Command::Classic {
            query,
            and,
            backend,
        } => {
            let operator = if and {
                DefaultOperator::And
            } else {
                DefaultOperator::Or
            };
            match compiler.compile_classic_with(&query, operator)? {
                Some(compiled) => render(&compiler, &compiled, backend)?,
                None => {
                    info!(query = %query, "every clause was dropped");
                    serde_json::Value::Null
                }
            }
        }
        Command::Path {
            path,
            field,
            backend,
        } => {
            let compiled = compiler.compile_path(&path, field.as_deref())?;
            render(&compiler, &compiled, backend)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn render(compiler: &QueryCompiler, query: &BackendQuery, backend: bool) -> Result<serde_json::Value> {
    if backend {
        return Ok(json!({
            "query": query,
            "lucene": query.to_string(),
        }));
    }
    Ok(compiler.to_dsl(query)?.to_json())
}

fn parse_templates(specs: &[String]) -> Result<TemplateRegistry> {
    let mut registry = TemplateRegistry::new();
    for spec in specs {
        let Some((field, template)) = spec.split_once('=') else {
            bail!("template '{}' is not of the form FIELD=TEMPLATE", spec);
        };
        registry.register(field.trim(), template.trim())?;
    }
    Ok(registry)
}
