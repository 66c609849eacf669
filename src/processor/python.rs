//! Structural processor for Python sources.

use super::Processor;
use crate::lang::Python;
use crate::metrics::{analyze_complexity, compute_metrics};
use crate::model::{Finding, ImprovementResult, Metrics, Priority, RuleOutcome};
use crate::security::PatternSet;
use crate::transform::{DocstringPass, Gate, PassPlan, SourceTree, StylePass, UnsafeCallPass};
use std::path::Path;
use tracing::{debug, warn};

const DOCSTRING_GATE: Gate = Gate::only(&[Priority::Readability, Priority::Security]);
const SECURITY_GATE: Gate = Gate::only(&[Priority::Security]);
const STYLE_GATE: Gate = Gate::only(&[Priority::Readability]);

const ANNOTATION_PREFIX: &str = "# SECURITY WARNING: ";

/// Parses Python with tree-sitter and runs the priority-gated pass plan.
pub struct PythonProcessor {
    patterns: &'static PatternSet,
    plan: PassPlan,
}

impl PythonProcessor {
    pub fn new() -> Self {
        let patterns = PatternSet::python();
        let plan = PassPlan::new()
            .tree_pass(DOCSTRING_GATE, DocstringPass::default())
            .tree_pass(SECURITY_GATE, UnsafeCallPass::new(patterns))
            .text_pass(STYLE_GATE, StylePass::default());
        Self::with_plan(patterns, plan)
    }

    /// Builds a processor with a custom detector table and plan.
    pub fn with_plan(patterns: &'static PatternSet, plan: PassPlan) -> Self {
        Self { patterns, plan }
    }

    pub fn plan(&self) -> &PassPlan {
        &self.plan
    }

    fn parse_failure(
        path: &Path,
        source: &str,
        message: String,
        findings: Vec<Finding>,
    ) -> ImprovementResult {
        warn!("Could not parse {}: {}", path.display(), message);
        let mut warnings = findings;
        warnings.push(Finding::new("parse-failure", "File could not be parsed"));
        ImprovementResult {
            file_path: path.to_path_buf(),
            improved_code: source.to_string(),
            metrics: Metrics::new(),
            improvements: vec![RuleOutcome::other(format!("parse failed: {message}"))],
            warnings,
            complexity: Vec::new(),
        }
    }
}

impl Default for PythonProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for PythonProcessor {
    fn name(&self) -> &'static str {
        "python"
    }

    fn process(&self, path: &Path, source: &str, priority: Priority) -> ImprovementResult {
        let (body, header_lines) = strip_annotation(source);
        let mut findings = self.patterns.scan_text(body);
        for location in findings.iter_mut().filter_map(|f| f.location.as_mut()) {
            location.line += header_lines;
        }

        let tree = match SourceTree::parse(&Python, body.to_string()) {
            Ok(tree) => tree,
            Err(e) => return Self::parse_failure(path, source, e.to_string(), findings),
        };
        if let Some(message) = tree.syntax_error() {
            return Self::parse_failure(path, source, message, findings);
        }

        let stage = self.plan.run_tree(tree, priority);
        let mut improvements = stage.outcomes;
        let mut diagnostics = stage.diagnostics;
        let tree = stage.tree;

        let metrics = compute_metrics(tree.source(), tree.tree());
        let complexity = analyze_complexity(tree.source(), tree.tree()).unwrap_or_else(|e| {
            warn!("Complexity analysis failed for {}: {}", path.display(), e);
            Vec::new()
        });

        let text = self.plan.run_text(tree.into_source(), priority);
        improvements.extend(text.outcomes);
        diagnostics.extend(text.diagnostics);

        let improved_code = if findings.is_empty() {
            text.text
        } else {
            annotate(&findings, &text.text)
        };

        improvements.extend(complexity.iter().map(|entry| entry.to_outcome()));

        let mut warnings = findings;
        warnings.extend(diagnostics);

        debug!(
            "Processed {} ({}): {} improvement(s), {} warning(s)",
            path.display(),
            priority,
            improvements.len(),
            warnings.len()
        );

        ImprovementResult {
            file_path: path.to_path_buf(),
            improved_code,
            metrics,
            improvements,
            warnings,
            complexity,
        }
    }
}

/// Prepends one `# SECURITY WARNING:` comment per distinct finding message.
fn annotate(findings: &[Finding], code: &str) -> String {
    let mut messages: Vec<&str> = Vec::new();
    for finding in findings {
        if !messages.contains(&finding.message.as_str()) {
            messages.push(&finding.message);
        }
    }
    let header: Vec<String> = messages
        .iter()
        .map(|m| format!("{ANNOTATION_PREFIX}{m}"))
        .collect();
    format!("{}\n\n{}", header.join("\n"), code)
}

/// Splits off a warning header left by an earlier run, returning the rest of
/// the source and the number of lines removed.
fn strip_annotation(source: &str) -> (&str, usize) {
    let mut offset = 0;
    let mut lines = 0;
    let mut rest = source.split_inclusive('\n').peekable();
    while let Some(line) = rest.next_if(|l| l.starts_with(ANNOTATION_PREFIX)) {
        offset += line.len();
        lines += 1;
    }
    if lines > 0 {
        if let Some(blank) = rest.next_if(|l| l.trim().is_empty()) {
            offset += blank.len();
            lines += 1;
        }
    }
    (&source[offset..], lines)
}
