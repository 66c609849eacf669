//! Language abstraction for structural parsing.

pub(crate) mod python;

pub use python::Python;

use crate::error::{PolishError, Result};
use tree_sitter::{Language as TsLanguage, Parser, Query, Tree};

/// A programming language with a tree-sitter grammar.
pub trait Language: Send + Sync {
    /// Returns the name of the language.
    fn name(&self) -> &'static str;

    /// Returns the file extensions associated with this language.
    fn extensions(&self) -> &[&'static str];

    /// Returns the tree-sitter language grammar.
    fn grammar(&self) -> TsLanguage;

    /// Parses source code into a tree-sitter AST.
    fn parse(&self, source: &str) -> Result<Tree> {
        parse_with(&self.grammar(), source)
    }

    /// Creates a tree-sitter query for this language.
    fn query(&self, pattern: &str) -> Result<Query> {
        Ok(Query::new(&self.grammar(), pattern)?)
    }

    /// Checks if this language handles the given file extension.
    fn matches_extension(&self, ext: &str) -> bool {
        self.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Parses `source` with an already resolved grammar.
pub(crate) fn parse_with(grammar: &TsLanguage, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser.set_language(grammar).map_err(|e| PolishError::Parse {
        message: format!("Failed to set language: {e}"),
    })?;

    parser.parse(source, None).ok_or_else(|| PolishError::Parse {
        message: "Failed to parse source".to_string(),
    })
}
