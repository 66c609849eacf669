//! Owned source text plus its syntax tree.

use crate::error::{PolishError, Result};
use crate::lang::{Language, parse_with};
use std::ops::Range;
use tree_sitter::{Language as TsLanguage, Node, Tree};

/// A single text edit against a [`SourceTree`]'s current source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    /// Replaces the bytes in `range`.
    pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    /// Inserts text at a byte offset.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

/// Source text and the tree parsed from it.
///
/// A `SourceTree` belongs to exactly one processing call. Rewrites produce a
/// new value; the caller drops the old one.
pub struct SourceTree {
    source: String,
    tree: Tree,
    grammar: TsLanguage,
}

impl SourceTree {
    /// Parses `source` with the given language.
    pub fn parse(language: &dyn Language, source: String) -> Result<Self> {
        let grammar = language.grammar();
        let tree = parse_with(&grammar, &source)?;
        Ok(Self {
            source,
            tree,
            grammar,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn grammar(&self) -> &TsLanguage {
        &self.grammar
    }

    /// Describes the first syntax error in the tree, if any.
    pub fn syntax_error(&self) -> Option<String> {
        let root = self.root();
        if !root.has_error() {
            return None;
        }

        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            if node.is_missing() {
                let pos = node.start_position();
                return Some(format!(
                    "missing '{}' at line {}, column {}",
                    node.kind(),
                    pos.row + 1,
                    pos.column + 1
                ));
            }
            if node.is_error() {
                let pos = node.start_position();
                return Some(format!(
                    "invalid syntax at line {}, column {}",
                    pos.row + 1,
                    pos.column + 1
                ));
            }
            // Only descend into subtrees that contain the error.
            if node.has_error() && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Some("invalid syntax".to_string());
                }
            }
        }
    }

    /// Applies `edits` and reparses.
    ///
    /// Edits must not overlap. A rewrite that turns a clean tree into one
    /// with syntax errors is rejected.
    pub fn rewrite(&self, mut edits: Vec<Edit>) -> Result<SourceTree> {
        edits.sort_by(|a, b| b.range.start.cmp(&a.range.start).then(b.range.end.cmp(&a.range.end)));

        let mut source = self.source.clone();
        let mut limit = source.len();
        for edit in &edits {
            let Range { start, end } = edit.range.clone();
            if start > end || end > limit {
                return Err(PolishError::Rewrite {
                    message: format!("overlapping or out-of-bounds edit at bytes {start}..{end}"),
                });
            }
            if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
                return Err(PolishError::Rewrite {
                    message: format!("edit at bytes {start}..{end} splits a character"),
                });
            }
            source.replace_range(start..end, &edit.replacement);
            limit = start;
        }

        let tree = parse_with(&self.grammar, &source)?;
        if !self.root().has_error() && tree.root_node().has_error() {
            return Err(PolishError::Rewrite {
                message: "rewrite introduced syntax errors".to_string(),
            });
        }

        Ok(SourceTree {
            source,
            tree,
            grammar: self.grammar.clone(),
        })
    }

    /// Regenerates the source text, consuming the tree.
    pub fn into_source(self) -> String {
        self.source
    }
}
