//! Error types for the improvement engine.

use thiserror::Error;

/// The main error type for improvement operations.
///
/// Errors raised inside a processor never cross the `Processor::process`
/// boundary; they are converted into result data there. Only batch setup
/// (output directory, archive extraction, configuration) surfaces them.
#[derive(Error, Debug)]
pub enum PolishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Tree-sitter parse error: {message}")]
    Parse { message: String },

    #[error("Tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("Rewrite failed: {message}")]
    Rewrite { message: String },

    #[error("Complexity analysis failed: {message}")]
    Complexity { message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for improvement operations.
pub type Result<T> = std::result::Result<T, PolishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = PolishError::Parse {
            message: "Failed to parse source".to_string(),
        };
        assert_eq!(err.to_string(), "Tree-sitter parse error: Failed to parse source");
    }
}
