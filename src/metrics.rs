//! Static code metrics and cyclomatic complexity ranking.
//!
//! Everything here is a pure function of its input. Aggregate metrics never
//! fail: ratios over empty inputs are defined as 0. Complexity analysis is
//! fallible and callers are expected to degrade to an empty result.

use crate::error::{PolishError, Result};
use crate::lang::python::{
    self, CLASS_KIND, FUNCTION_KIND, body_statements, definition_name, descendants_of_kind,
};
use crate::model::{ComplexityEntry, Metrics, metric};
use tree_sitter::{Node, Tree};

/// Line-level counts for a source text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub lines_of_code: usize,
    pub comment_lines: usize,
    pub comment_density: f64,
}

/// Counts total lines and `#` comment lines.
pub fn line_metrics(source: &str) -> LineMetrics {
    let mut lines_of_code = 0;
    let mut comment_lines = 0;
    for line in source.lines() {
        lines_of_code += 1;
        if line.trim_start().starts_with('#') {
            comment_lines += 1;
        }
    }

    let comment_density = if lines_of_code == 0 {
        0.0
    } else {
        round_to(comment_lines as f64 / lines_of_code as f64, 3)
    };

    LineMetrics {
        lines_of_code,
        comment_lines,
        comment_density,
    }
}

/// Text-only metrics, for sources without a structural tree.
pub fn compute_text_metrics(source: &str) -> Metrics {
    let lines = line_metrics(source);
    let mut metrics = Metrics::new();
    metrics.insert(metric::LINES_OF_CODE, lines.lines_of_code);
    metrics.insert(metric::COMMENT_LINES, lines.comment_lines);
    metrics.insert(metric::COMMENT_DENSITY, lines.comment_density);
    metrics
}

/// Full metrics for a parsed Python source.
pub fn compute_metrics(source: &str, tree: &Tree) -> Metrics {
    let root = tree.root_node();
    let functions = descendants_of_kind(root, FUNCTION_KIND);
    let class_count = descendants_of_kind(root, CLASS_KIND).len();

    let lengths: Vec<usize> = functions.iter().filter_map(|f| function_length(*f)).collect();
    let avg_function_length = if lengths.is_empty() {
        0.0
    } else {
        round_to(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64, 2)
    };
    let max_function_length = lengths.iter().copied().max().unwrap_or(0);

    let mut metrics = compute_text_metrics(source);
    metrics.insert(metric::FUNCTION_COUNT, functions.len());
    metrics.insert(metric::CLASS_COUNT, class_count);
    metrics.insert(metric::AVG_FUNCTION_LENGTH, avg_function_length);
    metrics.insert(metric::MAX_FUNCTION_LENGTH, max_function_length);
    metrics
}

/// Lines from the `def` line through the start of the last body statement.
/// Functions without body statements have no measurable length.
fn function_length(func: Node<'_>) -> Option<usize> {
    let last = body_statements(func).last().copied()?;
    let first_row = func.start_position().row;
    let last_row = last.start_position().row;
    Some(last_row.saturating_sub(first_row) + 1)
}

/// Maps a complexity score to its letter rank.
pub fn complexity_rank(complexity: usize) -> char {
    match complexity {
        0..=5 => 'A',
        6..=10 => 'B',
        11..=20 => 'C',
        21..=30 => 'D',
        31..=40 => 'E',
        _ => 'F',
    }
}

/// Computes cyclomatic complexity for every function, in document order.
///
/// Methods are reported as `Class.method`. Nested functions and classes are
/// scored on their own and do not contribute to the enclosing function.
pub fn analyze_complexity(source: &str, tree: &Tree) -> Result<Vec<ComplexityEntry>> {
    let root = tree.root_node();
    if root.has_error() {
        return Err(PolishError::Complexity {
            message: "source contains syntax errors".to_string(),
        });
    }

    descendants_of_kind(root, FUNCTION_KIND)
        .into_iter()
        .map(|func| {
            let name = qualified_name(func, source)?;
            let complexity = 1 + decision_points(func);
            Ok(ComplexityEntry {
                name,
                complexity,
                rank: complexity_rank(complexity),
                line: func.start_position().row + 1,
            })
        })
        .collect()
}

fn qualified_name(func: Node<'_>, source: &str) -> Result<String> {
    let name = definition_name(func, source).ok_or_else(|| PolishError::Complexity {
        message: format!(
            "function at line {} has no readable name",
            func.start_position().row + 1
        ),
    })?;

    let mut parts = vec![name];
    let mut current = func.parent();
    while let Some(node) = current {
        if node.kind() == CLASS_KIND {
            if let Some(class_name) = definition_name(node, source) {
                parts.push(class_name);
            }
        } else if node.kind() == FUNCTION_KIND {
            break;
        }
        current = node.parent();
    }
    parts.reverse();
    Ok(parts.join("."))
}

fn decision_points(func: Node<'_>) -> usize {
    let Some(body) = func.child_by_field_name("body") else {
        return 0;
    };

    let mut count = 0;
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        count += decision_weight(node);
        for child in python::named_children(node) {
            if matches!(child.kind(), FUNCTION_KIND | CLASS_KIND) {
                continue;
            }
            stack.push(child);
        }
    }
    count
}

fn decision_weight(node: Node<'_>) -> usize {
    match node.kind() {
        "if_statement" | "elif_clause" | "conditional_expression" | "for_statement"
        | "while_statement" | "for_in_clause" | "if_clause" | "except_clause"
        | "except_group_clause" | "boolean_operator" | "case_clause" => 1,
        // Loop and try `else` branches add a path; `if ... else` does not.
        "else_clause" => node.parent().is_some_and(|p| {
            matches!(p.kind(), "for_statement" | "while_statement" | "try_statement")
        }) as usize,
        _ => 0,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{Language, Python};

    fn metrics_for(source: &str) -> Metrics {
        let tree = Python.parse(source).unwrap();
        compute_metrics(source, &tree)
    }

    fn complexity_for(source: &str) -> Vec<ComplexityEntry> {
        let tree = Python.parse(source).unwrap();
        analyze_complexity(source, &tree).unwrap()
    }

    #[test]
    fn test_empty_source_has_zero_density() {
        let lines = line_metrics("");
        assert_eq!(lines.lines_of_code, 0);
        assert_eq!(lines.comment_density, 0.0);
    }

    #[test]
    fn test_comment_density() {
        let lines = line_metrics("# a\nx = 1\n  # b\ny = 2\n");
        assert_eq!(lines.lines_of_code, 4);
        assert_eq!(lines.comment_lines, 2);
        assert_eq!(lines.comment_density, 0.5);
    }

    #[test]
    fn test_no_functions_or_classes() {
        let metrics = metrics_for("x = 1\ny = x + 1\n");
        assert_eq!(metrics.int(metric::FUNCTION_COUNT), Some(0));
        assert_eq!(metrics.int(metric::CLASS_COUNT), Some(0));
        assert_eq!(metrics.number(metric::AVG_FUNCTION_LENGTH), Some(0.0));
        assert_eq!(metrics.int(metric::MAX_FUNCTION_LENGTH), Some(0));
    }

    #[test]
    fn test_function_lengths() {
        let source = "\
def short():
    return 1

def longer(x):
    y = x + 1
    z = y * 2
    return z

class Thing:
    def method(self):
        pass
";
        let metrics = metrics_for(source);
        assert_eq!(metrics.int(metric::FUNCTION_COUNT), Some(3));
        assert_eq!(metrics.int(metric::CLASS_COUNT), Some(1));
        assert_eq!(metrics.int(metric::MAX_FUNCTION_LENGTH), Some(4));
        // (2 + 4 + 2) / 3
        assert_eq!(metrics.number(metric::AVG_FUNCTION_LENGTH), Some(2.67));
        assert_eq!(metrics.int(metric::LINES_OF_CODE), Some(11));
    }

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(complexity_rank(1), 'A');
        assert_eq!(complexity_rank(5), 'A');
        assert_eq!(complexity_rank(6), 'B');
        assert_eq!(complexity_rank(10), 'B');
        assert_eq!(complexity_rank(11), 'C');
        assert_eq!(complexity_rank(21), 'D');
        assert_eq!(complexity_rank(31), 'E');
        assert_eq!(complexity_rank(41), 'F');
    }

    #[test]
    fn test_straight_line_function_has_complexity_one() {
        let entries = complexity_for("def f():\n    return 1\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "f");
        assert_eq!(entries[0].complexity, 1);
        assert_eq!(entries[0].rank, 'A');
    }

    #[test]
    fn test_decision_points() {
        let source = "\
def f(items, flag):
    total = 0
    for item in items:
        if item > 0 and flag:
            total += item
        elif item < 0:
            total -= 1
    try:
        pass
    except ValueError:
        pass
    return [x for x in items if x]
";
        let entries = complexity_for(source);
        // 1 + for + if + and + elif + except + comprehension for + comprehension if
        assert_eq!(entries[0].complexity, 8);
        assert_eq!(entries[0].rank, 'B');
    }

    #[test]
    fn test_nested_functions_are_scored_separately() {
        let source = "\
class Box:
    def outer(self):
        def inner(x):
            if x:
                return 1
            return 0
        return inner
";
        let entries = complexity_for(source);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Box.outer");
        assert_eq!(entries[0].complexity, 1);
        assert_eq!(entries[1].name, "inner");
        assert_eq!(entries[1].complexity, 2);
    }

    #[test]
    fn test_loop_else_counts() {
        let entries = complexity_for(
            "def f(xs):\n    for x in xs:\n        pass\n    else:\n        pass\n"
        );
        assert_eq!(entries[0].complexity, 3);
    }

    #[test]
    fn test_syntax_errors_fail_complexity() {
        let source = "def f(:\n    pass\n";
        let tree = Python.parse(source).unwrap();
        assert!(analyze_complexity(source, &tree).is_err());
    }
}
