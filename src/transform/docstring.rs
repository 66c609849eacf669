//! Inserts placeholder docstrings into undocumented functions.

use super::{Edit, Rewrite, SourceTree, TreePass};
use crate::error::Result;
use crate::lang::python::{
    FUNCTION_KIND, body_statements, definition_name, descendants_of_kind, has_docstring,
};
use crate::model::{OutcomeKind, RuleOutcome};
use tree_sitter::Node;

pub const DEFAULT_PLACEHOLDER: &str = "TODO: Add function description";

/// Adds a placeholder docstring as the first body statement of every
/// function that lacks one.
pub struct DocstringPass {
    placeholder: String,
}

impl DocstringPass {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    fn docstring(&self) -> String {
        format!("\"\"\"{}\"\"\"", self.placeholder.replace("\"\"\"", "\\\"\\\"\\\""))
    }

    fn edit_for(&self, func: Node<'_>, first: Node<'_>, source: &str) -> Edit {
        let start = first.start_byte();
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let prefix = &source[line_start..start];

        if first.start_position().row != func.start_position().row
            && prefix.chars().all(|c| c == ' ' || c == '\t')
        {
            return Edit::insert(start, format!("{}\n{}", self.docstring(), prefix));
        }

        // Body shares a line with the header (`def f(): return 1`):
        // move it onto its own indented line below the docstring.
        let indent = body_indent(func, source);
        let gap_start = source[..start].trim_end_matches([' ', '\t']).len();
        Edit::replace(
            gap_start..start,
            format!("\n{indent}{}\n{indent}", self.docstring()),
        )
    }
}

impl Default for DocstringPass {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

/// One indentation level deeper than the line `func` starts on.
fn body_indent(func: Node<'_>, source: &str) -> String {
    let start = func.start_byte();
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let outer: String = source[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    let unit = if outer.contains('\t') { "\t" } else { "    " };
    format!("{outer}{unit}")
}

impl TreePass for DocstringPass {
    fn name(&self) -> &'static str {
        "docstrings"
    }

    fn plan(&self, tree: &SourceTree) -> Result<Rewrite> {
        let source = tree.source();
        let mut rewrite = Rewrite::default();

        for func in descendants_of_kind(tree.root(), FUNCTION_KIND) {
            if has_docstring(func, source) {
                continue;
            }
            let Some(first) = body_statements(func).first().copied() else {
                continue;
            };
            let name = definition_name(func, source).unwrap_or("<anonymous>");
            rewrite.push(
                self.edit_for(func, first, source),
                RuleOutcome::new(
                    OutcomeKind::DocstringAdded,
                    format!("Added docstring to function '{name}'"),
                ),
            );
        }

        Ok(rewrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Python;

    fn run(source: &str) -> (String, Vec<RuleOutcome>) {
        let tree = SourceTree::parse(&Python, source.to_string()).unwrap();
        let rewrite = DocstringPass::default().plan(&tree).unwrap();
        let outcomes = rewrite.outcomes.clone();
        let rewritten = tree.rewrite(rewrite.edits).unwrap();
        (rewritten.into_source(), outcomes)
    }

    #[test]
    fn test_inserts_docstring_as_first_statement() {
        let (out, outcomes) = run("def add(a, b):\n    return a + b\n");
        assert_eq!(
            out,
            "def add(a, b):\n    \"\"\"TODO: Add function description\"\"\"\n    return a + b\n"
        );
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].description, "Added docstring to function 'add'");
        assert_eq!(outcomes[0].kind, OutcomeKind::DocstringAdded);
    }

    #[test]
    fn test_skips_documented_functions() {
        let (out, outcomes) = run("def f():\n    \"\"\"Already here.\"\"\"\n    return 1\n");
        assert!(outcomes.is_empty());
        assert_eq!(out.matches("\"\"\"").count(), 2);
    }

    #[test]
    fn test_methods_and_nested_functions() {
        let source = "\
class Greeter:
    def greet(self):
        def shout(text):
            return text.upper()
        return shout('hi')
";
        let (out, outcomes) = run(source);
        assert_eq!(outcomes.len(), 2);
        assert!(out.contains(
            "    def greet(self):\n        \"\"\"TODO: Add function description\"\"\"\n        def shout"
        ));
        assert!(out.contains(
            "        def shout(text):\n            \"\"\"TODO: Add function description\"\"\"\n            return"
        ));
    }

    #[test]
    fn test_one_line_function() {
        let (out, outcomes) = run("def f(): return 1\n");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            out,
            "def f():\n    \"\"\"TODO: Add function description\"\"\"\n    return 1\n"
        );
    }

    #[test]
    fn test_docstring_goes_after_leading_comment() {
        let (out, _) = run("def f():\n    # note\n    return 1\n");
        assert_eq!(
            out,
            "def f():\n    # note\n    \"\"\"TODO: Add function description\"\"\"\n    return 1\n"
        );
    }

    #[test]
    fn test_second_run_adds_nothing() {
        let (once, _) = run("def a():\n    pass\n\nasync def b():\n    await c()\n");
        let (twice, outcomes) = run(&once);
        assert!(outcomes.is_empty());
        assert_eq!(once, twice);
    }
}
