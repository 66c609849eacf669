//! Security pattern set: lexical and structural detectors.
//!
//! Lexical detectors are regexes over raw text and run before any parsing, so
//! their findings survive parse failures. Structural detectors match call
//! nodes by callee name and also tell the remediation pass which call sites
//! have a safe substitute.
//!
//! A detector that cannot run (bad pattern, bad query, panic) yields a single
//! `scanner-error` finding; the remaining detectors still run.

use crate::model::{Finding, Location};
use regex::Regex;
use std::ops::Range;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language as TsLanguage, Query, QueryCursor, Tree};
use tracing::warn;

/// Rule id used for diagnostics produced when a detector fails.
pub const SCANNER_ERROR: &str = "scanner-error";

/// Which family a detector belongs to. Findings are not deduplicated across tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    RiskyApi,
    HardcodedSecret,
}

/// A regex detector over raw source text.
pub struct LexicalDetector {
    pub id: &'static str,
    pub tier: Tier,
    pub message: &'static str,
    pattern: Result<Regex, String>,
}

impl LexicalDetector {
    pub fn new(id: &'static str, tier: Tier, pattern: &str, message: &'static str) -> Self {
        Self {
            id,
            tier,
            message,
            pattern: Regex::new(pattern).map_err(|e| e.to_string()),
        }
    }

    fn scan(&self, text: &str) -> Result<Vec<Finding>, String> {
        let pattern = self.pattern.as_ref().map_err(Clone::clone)?;
        Ok(pattern
            .find_iter(text)
            .map(|m| Finding::new(self.id, self.message).at(location_of(text, m.start())))
            .collect())
    }
}

/// How a structural rule matches a call's callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    /// The callee text equals this name (`eval`, `os.system`).
    Exact(&'static str),
    /// Any attribute of this module (`subprocess.run`, `subprocess.call`).
    Module(&'static str),
}

impl Callee {
    fn matches(&self, callee: &str) -> bool {
        match self {
            Callee::Exact(name) => callee == *name,
            Callee::Module(module) => callee
                .strip_prefix(module)
                .is_some_and(|rest| rest.starts_with('.')),
        }
    }
}

/// A structural detector over call nodes.
#[derive(Debug, Clone)]
pub struct CallRule {
    pub id: &'static str,
    pub callee: Callee,
    pub message: &'static str,
    /// Identifier the remediation pass substitutes for the callee, if any.
    pub substitute: Option<&'static str>,
}

/// A call site matched by a structural rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub rule: &'static str,
    pub callee: String,
    pub callee_range: Range<usize>,
    pub location: Location,
    pub substitute: Option<&'static str>,
}

// A secret-like name bound to a quoted literal of 4+ characters.
// `name: Type = "..."` and `key: "..."` forms count as bindings.
const SECRET_ASSIGNMENT: &str = concat!(
    r"(?i)\b\w*(?:password|passwd|secret|token)\w*\s*",
    r"(?::\s*[\w\[\], .]+?\s*=|[:=])\s*",
    r#"(?:"[^"\n]{4,}"|'[^'\n]{4,}')"#,
);

const CALL_QUERY: &str = "(call function: [(identifier) (attribute)] @callee)";

/// An ordered table of detectors.
pub struct PatternSet {
    lexical: Vec<LexicalDetector>,
    structural: Vec<CallRule>,
}

static PYTHON: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::new(
        vec![
            LexicalDetector::new(
                "eval",
                Tier::RiskyApi,
                r"\beval\s*\(",
                "Use of 'eval' detected, which can execute arbitrary code.",
            ),
            LexicalDetector::new(
                "exec",
                Tier::RiskyApi,
                r"\bexec\s*\(",
                "Use of 'exec' detected, which can execute arbitrary code.",
            ),
            LexicalDetector::new(
                "subprocess",
                Tier::RiskyApi,
                r"\bsubprocess\.",
                "Use of subprocess module detected, check for unsanitized input.",
            ),
            LexicalDetector::new(
                "os-system",
                Tier::RiskyApi,
                r"\bos\.system\s*\(",
                "Use of os.system detected, which may execute unsanitized input.",
            ),
            LexicalDetector::new(
                "shell-concat",
                Tier::RiskyApi,
                r#"\b(?:subprocess\.\w+|os\.system|os\.popen)\s*\([^)\n]*(?:\+|%|\.format\(|\bf["'])"#,
                "Possible command injection: shell command built from concatenated input.",
            ),
            LexicalDetector::new(
                "pickle",
                Tier::RiskyApi,
                r"\bpickle\.",
                "Use of pickle module detected, it is insecure with untrusted input.",
            ),
            LexicalDetector::new(
                "input",
                Tier::RiskyApi,
                r"\binput\s*\(",
                "Use of input() without validation can lead to security risks.",
            ),
            LexicalDetector::new(
                "hardcoded-secret",
                Tier::HardcodedSecret,
                SECRET_ASSIGNMENT,
                "Possible hardcoded secret detected.",
            ),
        ],
        vec![
            CallRule {
                id: "eval-call",
                callee: Callee::Exact("eval"),
                message: "Call to eval() executes arbitrary code.",
                substitute: Some("safe_eval"),
            },
            CallRule {
                id: "exec-call",
                callee: Callee::Exact("exec"),
                message: "Call to exec() executes arbitrary code.",
                substitute: None,
            },
            CallRule {
                id: "os-system-call",
                callee: Callee::Exact("os.system"),
                message: "Call to os.system() runs a shell command.",
                substitute: None,
            },
            CallRule {
                id: "pickle-load-call",
                callee: Callee::Exact("pickle.loads"),
                message: "Call to pickle.loads() deserializes untrusted data.",
                substitute: None,
            },
            CallRule {
                id: "pickle-load-call",
                callee: Callee::Exact("pickle.load"),
                message: "Call to pickle.load() deserializes untrusted data.",
                substitute: None,
            },
            CallRule {
                id: "subprocess-call",
                callee: Callee::Module("subprocess"),
                message: "Call into subprocess; check for unsanitized input.",
                substitute: None,
            },
        ],
    )
});

static SCRIPT: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::new(
        vec![LexicalDetector::new(
            "eval",
            Tier::RiskyApi,
            r"\beval\s*\(",
            "Found eval() usage - potential security risk",
        )],
        Vec::new(),
    )
});

impl PatternSet {
    pub fn new(lexical: Vec<LexicalDetector>, structural: Vec<CallRule>) -> Self {
        Self {
            lexical,
            structural,
        }
    }

    /// The detector table used for Python sources.
    pub fn python() -> &'static PatternSet {
        &PYTHON
    }

    /// The dynamic-evaluation-only table used for shallow script support.
    pub fn script() -> &'static PatternSet {
        &SCRIPT
    }

    pub fn lexical(&self) -> &[LexicalDetector] {
        &self.lexical
    }

    pub fn structural(&self) -> &[CallRule] {
        &self.structural
    }

    /// Runs every lexical detector over `text`, in table order.
    pub fn scan_text(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for detector in &self.lexical {
            match catch_unwind(AssertUnwindSafe(|| detector.scan(text))) {
                Ok(Ok(found)) => findings.extend(found),
                Ok(Err(e)) => findings.push(detector_failure(detector.id, &e)),
                Err(_) => findings.push(detector_failure(detector.id, "detector panicked")),
            }
        }
        findings
    }

    /// Runs the structural detectors over a parsed tree.
    pub fn scan_tree(&self, source: &str, tree: &Tree, grammar: &TsLanguage) -> Vec<Finding> {
        match self.call_sites(source, tree, grammar) {
            Ok(sites) => sites
                .into_iter()
                .map(|site| {
                    let message = self
                        .structural
                        .iter()
                        .find(|r| r.id == site.rule && r.callee.matches(&site.callee))
                        .map_or("", |r| r.message);
                    Finding::new(site.rule, message).at(site.location)
                })
                .collect(),
            Err(e) => vec![detector_failure("call-rules", &e)],
        }
    }

    /// Finds every call whose callee matches a structural rule.
    pub fn call_sites(
        &self,
        source: &str,
        tree: &Tree,
        grammar: &TsLanguage,
    ) -> Result<Vec<CallSite>, String> {
        if self.structural.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::new(grammar, CALL_QUERY).map_err(|e| e.to_string())?;
        let mut cursor = QueryCursor::new();
        let source_bytes = source.as_bytes();
        let mut sites = Vec::new();

        let mut matches = cursor.matches(&query, tree.root_node(), source_bytes);
        while let Some(query_match) = matches.next() {
            for capture in query_match.captures {
                let node = capture.node;
                let text = node.utf8_text(source_bytes).map_err(|e| e.to_string())?;
                let callee: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                if let Some(rule) = self.structural.iter().find(|r| r.callee.matches(&callee)) {
                    sites.push(CallSite {
                        rule: rule.id,
                        callee,
                        callee_range: node.byte_range(),
                        location: Location::from_point(node.start_position()),
                        substitute: rule.substitute,
                    });
                }
            }
        }

        sites.sort_by_key(|s| s.callee_range.start);
        Ok(sites)
    }
}

fn detector_failure(id: &str, error: &str) -> Finding {
    warn!("Security detector {} failed: {}", id, error);
    Finding::new(SCANNER_ERROR, format!("Error scanning file ({id}): {error}"))
}

/// 1-based line and column of a byte offset.
pub(crate) fn location_of(text: &str, offset: usize) -> Location {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    Location {
        line,
        column: before[line_start..].chars().count() + 1,
    }
}
