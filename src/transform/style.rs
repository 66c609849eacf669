//! Whitespace and indentation canonicalization over regenerated text.
//!
//! This is a line-oriented pass with no view of the syntax tree. Lines inside
//! multi-line string literals are normalized like any other line, so trailing
//! whitespace or tab indentation inside such literals is changed too.

use super::{TextPass, TextRewrite};
use crate::error::{PolishError, Result};
use crate::model::{OutcomeKind, RuleOutcome};
use regex::Regex;
use std::sync::LazyLock;

static TOP_LEVEL_DEF: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(?:(?:async\s+)?def|class)\s+\w|^@\w"));

const MAX_BLANK_RUN: usize = 2;
const BLANKS_BEFORE_TOP_LEVEL: usize = 2;

/// Canonicalizes line endings, indentation, trailing whitespace and blank lines.
pub struct StylePass {
    indent_width: usize,
}

impl StylePass {
    pub fn new(indent_width: usize) -> Self {
        Self {
            indent_width: indent_width.max(1),
        }
    }

    fn expand_indent(&self, line: &str) -> Option<String> {
        let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
        let indent = &line[..indent_len];
        if !indent.contains('\t') {
            return None;
        }

        let mut width = 0;
        for c in indent.chars() {
            width = match c {
                '\t' => (width / self.indent_width + 1) * self.indent_width,
                _ => width + 1,
            };
        }
        Some(format!("{}{}", " ".repeat(width), &line[indent_len..]))
    }
}

impl Default for StylePass {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TextPass for StylePass {
    fn name(&self) -> &'static str {
        "style"
    }

    fn apply(&self, text: &str) -> Result<TextRewrite> {
        let mut outcomes = Vec::new();
        let mut record = |count: usize, description: String| {
            if count > 0 {
                outcomes.push(RuleOutcome::new(OutcomeKind::StyleNormalized, description));
            }
        };

        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        record(
            (normalized != text) as usize,
            "Normalized line endings to LF".to_string(),
        );

        let mut lines: Vec<String> = normalized.split('\n').map(str::to_string).collect();
        // `split` yields a final empty element for text ending in '\n'.
        let had_final_newline = normalized.ends_with('\n');
        if had_final_newline {
            lines.pop();
        }

        let mut expanded = 0;
        for line in &mut lines {
            if let Some(fixed) = self.expand_indent(line) {
                *line = fixed;
                expanded += 1;
            }
        }
        record(expanded, format!("Expanded tab indentation on {expanded} line(s)"));

        let mut trimmed = 0;
        for line in &mut lines {
            let keep = line.trim_end().len();
            if keep != line.len() {
                line.truncate(keep);
                trimmed += 1;
            }
        }
        record(trimmed, format!("Removed trailing whitespace on {trimmed} line(s)"));

        let before = lines.len();
        lines = collapse_blank_runs(lines);
        let collapsed = before - lines.len();
        record(collapsed, format!("Removed {collapsed} excess blank line(s)"));

        let inserted = match TOP_LEVEL_DEF.as_ref() {
            Ok(pattern) => separate_top_level(&mut lines, pattern),
            Err(e) => return Err(PolishError::Regex(e.clone())),
        };
        record(
            inserted,
            format!("Inserted {inserted} blank line(s) before top-level definitions"),
        );

        let mut tail_blanks = 0;
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
            tail_blanks += 1;
        }
        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        record(
            (tail_blanks > 0 || (!had_final_newline && !out.is_empty())) as usize,
            "Ensured a single trailing newline".to_string(),
        );

        Ok(TextRewrite {
            text: out,
            outcomes,
        })
    }
}

fn collapse_blank_runs(lines: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut run = 0;
    for line in lines {
        if line.is_empty() {
            run += 1;
            if run > MAX_BLANK_RUN {
                continue;
            }
        } else {
            run = 0;
        }
        out.push(line);
    }
    out
}

/// Ensures two blank lines above each top-level `def`, `class` or decorator,
/// counting comment lines directly above it as part of the definition.
fn separate_top_level(lines: &mut Vec<String>, pattern: &Regex) -> usize {
    let mut inserted = 0;
    let mut i = 0;
    while i < lines.len() {
        if !pattern.is_match(&lines[i]) {
            i += 1;
            continue;
        }

        let mut head = i;
        while head > 0 && lines[head - 1].starts_with('#') {
            head -= 1;
        }
        let mut blanks = 0;
        while head > blanks && lines[head - blanks - 1].is_empty() {
            blanks += 1;
        }

        let at_file_start = head == blanks;
        let follows_decorator = blanks == 0 && head > 0 && lines[head - 1].starts_with('@');
        if at_file_start || follows_decorator || blanks >= BLANKS_BEFORE_TOP_LEVEL {
            i += 1;
            continue;
        }

        let missing = BLANKS_BEFORE_TOP_LEVEL - blanks;
        for _ in 0..missing {
            lines.insert(head, String::new());
        }
        inserted += missing;
        i += missing + 1;
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(text: &str) -> TextRewrite {
        StylePass::default().apply(text).unwrap()
    }

    #[test]
    fn test_clean_text_is_untouched() {
        let text = "import os\n\n\ndef f():\n    return 1\n";
        let rewrite = style(text);
        assert_eq!(rewrite.text, text);
        assert!(rewrite.outcomes.is_empty());
    }

    #[test]
    fn test_trailing_whitespace_and_tabs() {
        let rewrite = style("def f():\n\treturn 1   \n");
        assert_eq!(rewrite.text, "def f():\n    return 1\n");
        assert_eq!(rewrite.outcomes.len(), 2);
        assert!(rewrite.outcomes.iter().all(|o| o.kind == OutcomeKind::StyleNormalized));
    }

    #[test]
    fn test_mixed_indent_expands_to_tab_stops() {
        let rewrite = style("if x:\n  \ty = 1\n");
        assert_eq!(rewrite.text, "if x:\n    y = 1\n");
    }

    #[test]
    fn test_crlf_and_missing_final_newline() {
        let rewrite = style("x = 1\r\ny = 2");
        assert_eq!(rewrite.text, "x = 1\ny = 2\n");
        assert_eq!(rewrite.outcomes.len(), 2);
    }

    #[test]
    fn test_blank_runs_collapse() {
        let rewrite = style("x = 1\n\n\n\n\ny = 2\n\n\n");
        assert_eq!(rewrite.text, "x = 1\n\n\ny = 2\n");
    }

    #[test]
    fn test_top_level_definitions_get_two_blank_lines() {
        let rewrite = style(
            "import os\ndef f():\n    pass\n# helper\n@cache\ndef g():\n    pass\n"
        );
        assert_eq!(
            rewrite.text,
            "import os\n\n\ndef f():\n    pass\n\n\n# helper\n@cache\ndef g():\n    pass\n"
        );
    }

    #[test]
    fn test_nested_definitions_are_not_separated() {
        let text = "class A:\n    x = 1\n    def m(self):\n        pass\n";
        assert_eq!(style(text).text, text);
    }

    #[test]
    fn test_idempotent() {
        let once = style("import os\ndef f():\n\treturn 1  \n\n\n\n").text;
        let twice = style(&once);
        assert_eq!(twice.text, once);
        assert!(twice.outcomes.is_empty());
    }

    #[test]
    fn test_empty_text() {
        let rewrite = style("");
        assert_eq!(rewrite.text, "");
        assert!(rewrite.outcomes.is_empty());
    }
}
