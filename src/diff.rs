//! Diffs between original and improved sources, for dry-run previews.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Generates a unified diff between two strings.
pub fn unified_diff(original: &str, modified: &str, path: &Path) -> String {
    render(original, modified, path, false)
}

/// Colorized diff output for terminal display.
pub fn colorized_diff(original: &str, modified: &str, path: &Path) -> String {
    render(original, modified, path, true)
}

fn render(original: &str, modified: &str, path: &Path, color: bool) -> String {
    let diff = TextDiff::from_lines(original, modified);
    let paint = |code: &'static str| if color { code } else { "" };
    let reset = paint(RESET);

    let mut output = format!(
        "{cyan}--- a/{p}{reset}\n{cyan}+++ b/{p}{reset}\n",
        cyan = paint(CYAN),
        p = path.display(),
    );

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str("@@\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let (sign, tint) = match change.tag() {
                    ChangeTag::Delete => ("-", paint(RED)),
                    ChangeTag::Insert => ("+", paint(GREEN)),
                    ChangeTag::Equal => (" ", ""),
                };
                let value = change.value();
                let newline = if value.ends_with('\n') { "" } else { "\n" };
                if tint.is_empty() {
                    output.push_str(&format!("{sign}{value}{newline}"));
                } else {
                    output.push_str(&format!("{tint}{sign}{value}{reset}{newline}"));
                }
            }
        }
    }

    output
}

/// Line-level change counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut insertions = 0;
        let mut deletions = 0;

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            files_changed: usize::from(insertions > 0 || deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} insertions(+), {} deletions(-)",
            self.files_changed, self.insertions, self.deletions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff_marks_changes() {
        let diff = unified_diff("a\nb\n", "a\nc\n", Path::new("x.py"));
        assert!(diff.starts_with("--- a/x.py\n+++ b/x.py\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+c\n"));
        assert!(!diff.contains('\x1b'));
    }

    #[test]
    fn test_colorized_diff_uses_ansi() {
        let diff = colorized_diff("a\n", "b\n", Path::new("x.py"));
        assert!(diff.contains("\x1b[31m-a"));
        assert!(diff.contains("\x1b[32m+b"));
    }

    #[test]
    fn test_summary_counts_and_merge() {
        let mut total = DiffSummary::from_diff("a\nb\n", "a\nc\nd\n");
        assert_eq!(total.insertions, 2);
        assert_eq!(total.deletions, 1);
        assert_eq!(total.files_changed, 1);

        total.merge(&DiffSummary::from_diff("same\n", "same\n"));
        assert_eq!(total.files_changed, 1);
        assert_eq!(total.to_string(), "1 file(s) changed, 2 insertions(+), 1 deletions(-)");
    }
}
