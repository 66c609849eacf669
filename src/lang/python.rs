//! Python language support.

use super::Language;
use tree_sitter::{Language as TsLanguage, Node};

/// Python programming language.
pub struct Python;

impl Language for Python {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &[&'static str] {
        &["py", "pyi"]
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_python::LANGUAGE.into()
    }
}

pub(crate) const FUNCTION_KIND: &str = "function_definition";
pub(crate) const CLASS_KIND: &str = "class_definition";

/// Collects every node of `kind` under `root`, in document order.
pub(crate) fn descendants_of_kind<'t>(root: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.kind() == kind {
            out.push(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return out;
            }
        }
    }
}

/// Named children of `node`, in order.
pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// The statements of a function or class body, comments excluded.
pub(crate) fn body_statements(def: Node<'_>) -> Vec<Node<'_>> {
    def.child_by_field_name("body")
        .map(|body| {
            named_children(body)
                .into_iter()
                .filter(|n| n.kind() != "comment")
                .collect()
        })
        .unwrap_or_default()
}

/// The declared name of a function or class definition.
pub(crate) fn definition_name<'s>(def: Node<'_>, source: &'s str) -> Option<&'s str> {
    def.child_by_field_name("name")
        .and_then(|name| name.utf8_text(source.as_bytes()).ok())
}

/// True if the first body statement of `def` is a docstring.
pub(crate) fn has_docstring(def: Node<'_>, source: &str) -> bool {
    body_statements(def)
        .first()
        .is_some_and(|stmt| is_docstring_statement(*stmt, source))
}

fn is_docstring_statement(stmt: Node<'_>, source: &str) -> bool {
    if stmt.kind() != "expression_statement" {
        return false;
    }
    let children = named_children(stmt);
    let [expr] = children.as_slice() else {
        return false;
    };
    match expr.kind() {
        "string" => is_text_literal(*expr, source),
        "concatenated_string" => named_children(*expr)
            .first()
            .is_some_and(|first| first.kind() == "string" && is_text_literal(*first, source)),
        _ => false,
    }
}

// Byte and f-string literals are not docstrings.
fn is_text_literal(string: Node<'_>, source: &str) -> bool {
    let text = string.utf8_text(source.as_bytes()).unwrap_or("");
    !text
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .any(|c| matches!(c.to_ascii_lowercase(), 'b' | 'f'))
}
