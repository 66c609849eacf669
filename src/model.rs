//! Core data types shared by processors, passes and reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Caller-selected policy deciding which rewrite passes may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Security,
    Performance,
    #[default]
    Readability,
}

impl Priority {
    /// All priorities, in declaration order.
    pub const ALL: [Priority; 3] = [
        Priority::Security,
        Priority::Performance,
        Priority::Readability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Security => "security",
            Priority::Performance => "performance",
            Priority::Readability => "readability",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown priority '{s}' (expected security, performance or readability)")
            })
    }
}

/// A 1-based position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Builds a location from a tree-sitter (0-based) point.
    pub fn from_point(point: tree_sitter::Point) -> Self {
        Self {
            line: point.row + 1,
            column: point.column + 1,
        }
    }
}

/// A security or diagnostic observation. Purely descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that produced this finding.
    pub rule: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Finding {
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{} (line {})", self.message, loc.line),
            None => f.write_str(&self.message),
        }
    }
}

/// What kind of change a [`RuleOutcome`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    DocstringAdded,
    UnsafeCallReplaced,
    StyleNormalized,
    Other,
}

/// One applied transformation (or informational entry such as a complexity rank).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub description: String,
    pub kind: OutcomeKind,
}

impl RuleOutcome {
    pub fn new(kind: OutcomeKind, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind,
        }
    }

    pub fn other(description: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Other, description)
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// A single metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(usize),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{v}"),
            MetricValue::Float(v) => write!(f, "{v}"),
            MetricValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

/// Metric names used across processors.
pub mod metric {
    pub const LINES_OF_CODE: &str = "lines_of_code";
    pub const COMMENT_LINES: &str = "comment_lines";
    pub const COMMENT_DENSITY: &str = "comment_density";
    pub const FUNCTION_COUNT: &str = "function_count";
    pub const CLASS_COUNT: &str = "class_count";
    pub const AVG_FUNCTION_LENGTH: &str = "avg_function_length";
    pub const MAX_FUNCTION_LENGTH: &str = "max_function_length";
    pub const FILE_TYPE: &str = "file_type";
}

/// Named metric values for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, MetricValue>);

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics for files without structural support: line count and file type.
    pub fn line_count_only(source: &str, file_type: &str) -> Self {
        let mut metrics = Self::new();
        metrics.insert(metric::LINES_OF_CODE, source.lines().count());
        metrics.insert(metric::FILE_TYPE, file_type);
        metrics
    }

    pub fn insert(&mut self, name: &str, value: impl Into<MetricValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    /// Returns an integer metric, if present and integral.
    pub fn int(&self, name: &str) -> Option<usize> {
        match self.0.get(name) {
            Some(MetricValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a numeric metric as a float (integers are widened).
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(MetricValue::Int(v)) => Some(*v as f64),
            Some(MetricValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Cyclomatic complexity of one function-like unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityEntry {
    pub name: String,
    pub complexity: usize,
    pub rank: char,
    pub line: usize,
}

impl ComplexityEntry {
    /// The informational outcome appended after structural outcomes.
    pub fn to_outcome(&self) -> RuleOutcome {
        RuleOutcome::other(format!(
            "Function '{}' complexity: {} ({})",
            self.name, self.complexity, self.rank
        ))
    }
}

/// Rule id for file-level I/O problems.
pub const IO_FAILURE: &str = "io-failure";

/// The per-file output of a processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementResult {
    pub file_path: PathBuf,
    pub improved_code: String,
    pub metrics: Metrics,
    pub improvements: Vec<RuleOutcome>,
    pub warnings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complexity: Vec<ComplexityEntry>,
}

impl ImprovementResult {
    /// Result for a file returned unchanged with line-count metrics.
    pub fn unchanged(path: &Path, source: &str, file_type: &str) -> Self {
        Self {
            file_path: path.to_path_buf(),
            improved_code: source.to_string(),
            metrics: Metrics::line_count_only(source, file_type),
            improvements: Vec::new(),
            warnings: Vec::new(),
            complexity: Vec::new(),
        }
    }

    /// Result for a file that could not be read.
    pub fn io_failure(path: &Path, error: &std::io::Error) -> Self {
        Self::file_failure(path, format!("could not read file: {error}"))
    }

    /// Result with no text or metrics and a single `io-failure` warning.
    pub fn file_failure(path: &Path, message: impl Into<String>) -> Self {
        Self {
            file_path: path.to_path_buf(),
            improved_code: String::new(),
            metrics: Metrics::new(),
            improvements: Vec::new(),
            warnings: vec![Finding::new(IO_FAILURE, message)],
            complexity: Vec::new(),
        }
    }

    /// Returns true if any outcome of the given kind was recorded.
    pub fn has_outcome(&self, kind: OutcomeKind) -> bool {
        self.improvements.iter().any(|o| o.kind == kind)
    }

    /// Counts outcomes of the given kind.
    pub fn count_outcomes(&self, kind: OutcomeKind) -> usize {
        self.improvements.iter().filter(|o| o.kind == kind).count()
    }
}
