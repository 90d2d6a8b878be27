use thiserror::Error;

/// Main error type for query compilation
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Syntax error at position {position}: expected {expected}, found {found}")]
    Syntax {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Template already registered for field '{0}'")]
    DuplicateTemplate(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Exact term search is not enabled for property '{field}'")]
    ExactTermNotEnabled { field: String },

    #[error("Unknown namespace prefix: {0}")]
    UnknownPrefix(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

impl CompileError {
    /// Build a syntax error from a position and the tokens involved
    pub fn syntax(position: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        CompileError::Syntax {
            position,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Whether the caller may drop the offending clause and keep compiling
    ///
    /// Only local failures qualify; anything that invalidates the whole
    /// expression aborts compilation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CompileError::UnknownPrefix(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompileError::syntax(4, "')'", "end of input");
        assert_eq!(
            err.to_string(),
            "Syntax error at position 4: expected ')', found end of input"
        );

        let err = CompileError::ExactTermNotEnabled {
            field: "cm:title".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Exact term search is not enabled for property 'cm:title'"
        );
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(CompileError::UnknownPrefix("xx".to_string()).is_recoverable());
        assert!(!CompileError::Unsupported("predicate".to_string()).is_recoverable());
        assert!(!CompileError::DuplicateTemplate("text".to_string()).is_recoverable());
    }
}
