//! Target query DSL and the translator from backend query objects

pub mod target;
pub mod translator;

pub use target::DslQuery;
pub use translator::DslTranslator;
