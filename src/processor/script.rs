//! Shallow processor for JavaScript and TypeScript.
//!
//! No syntax tree is built. Both rewrites are plain textual substitutions and
//! can produce invalid or behavior-changing output: commenting out from `eval(`
//! to the end of the line, and turning every `var` into `let` regardless of
//! hoisting. Each rewrite that fires adds a `degraded-rewrite` warning.

use super::Processor;
use crate::model::{Finding, ImprovementResult, Metrics, OutcomeKind, Priority, RuleOutcome};
use crate::security::PatternSet;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static EVAL_CALL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\beval\s*\("));
static VAR_DECL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\bvar(\s+)"));

const DISABLED_MARKER: &str = "// SECURITY REMOVED: ";

/// Lexical-only support for script languages.
pub struct ScriptProcessor {
    patterns: &'static PatternSet,
    file_type: &'static str,
}

impl ScriptProcessor {
    pub fn new() -> Self {
        Self {
            patterns: PatternSet::script(),
            file_type: "JavaScript/TypeScript",
        }
    }

    fn disable_eval(&self, code: &str, pattern: &Regex) -> (String, usize) {
        let count = pattern.find_iter(code).count();
        let replaced = pattern
            .replace_all(code, |caps: &regex::Captures<'_>| {
                format!("{DISABLED_MARKER}{}", &caps[0])
            })
            .into_owned();
        (replaced, count)
    }

    fn block_scope_vars(&self, code: &str, pattern: &Regex) -> (String, usize) {
        let count = pattern.find_iter(code).count();
        (pattern.replace_all(code, "let$1").into_owned(), count)
    }
}

impl Default for ScriptProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ScriptProcessor {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn process(&self, path: &Path, source: &str, priority: Priority) -> ImprovementResult {
        let mut warnings = self.patterns.scan_text(source);
        let mut improvements = Vec::new();
        let mut code = source.to_string();

        if priority == Priority::Security {
            match EVAL_CALL.as_ref() {
                Ok(pattern) => {
                    let (replaced, count) = self.disable_eval(&code, pattern);
                    if count > 0 {
                        code = replaced;
                        improvements.push(RuleOutcome::new(
                            OutcomeKind::UnsafeCallReplaced,
                            format!("Disabled {count} eval() call(s) with a comment marker"),
                        ));
                        warnings.push(Finding::new(
                            "degraded-rewrite",
                            "eval() was disabled textually; the rest of each affected line is now a comment",
                        ));
                    }
                }
                Err(e) => warnings.push(Finding::new(
                    "pass-failure",
                    format!("eval rewrite failed: {e}"),
                )),
            }
        }

        if priority == Priority::Readability {
            match VAR_DECL.as_ref() {
                Ok(pattern) => {
                    let (replaced, count) = self.block_scope_vars(&code, pattern);
                    if count > 0 {
                        code = replaced;
                        improvements.push(RuleOutcome::new(
                            OutcomeKind::StyleNormalized,
                            format!("Converted {count} 'var' declaration(s) to 'let'"),
                        ));
                        warnings.push(Finding::new(
                            "degraded-rewrite",
                            "'var' was replaced textually; review code relying on function-scoped hoisting",
                        ));
                    }
                }
                Err(e) => warnings.push(Finding::new(
                    "pass-failure",
                    format!("var rewrite failed: {e}"),
                )),
            }
        }

        ImprovementResult {
            file_path: path.to_path_buf(),
            improved_code: code,
            metrics: Metrics::line_count_only(source, self.file_type),
            improvements,
            warnings,
            complexity: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metric;

    fn process(source: &str, priority: Priority) -> ImprovementResult {
        ScriptProcessor::new().process(Path::new("app.js"), source, priority)
    }

    #[test]
    fn test_eval_is_reported_under_every_priority() {
        for priority in Priority::ALL {
            let result = process("const x = eval(input);\n", priority);
            assert_eq!(result.warnings[0].message, "Found eval() usage - potential security risk");
        }
    }

    #[test]
    fn test_security_disables_eval() {
        let result = process("run();\neval(code);\n", Priority::Security);
        assert_eq!(result.improved_code, "run();\n// SECURITY REMOVED: eval(code);\n");
        assert_eq!(result.count_outcomes(OutcomeKind::UnsafeCallReplaced), 1);
        assert!(result.warnings.iter().any(|w| w.rule == "degraded-rewrite"));
    }

    #[test]
    fn test_readability_converts_var() {
        let result = process("var a = 1;\nvar  b = 2;\nconst myvar = 3;\n", Priority::Readability);
        assert_eq!(result.improved_code, "let a = 1;\nlet  b = 2;\nconst myvar = 3;\n");
        assert_eq!(
            result.improvements[0].description,
            "Converted 2 'var' declaration(s) to 'let'"
        );
    }

    #[test]
    fn test_no_rewrite_without_matches() {
        let source = "let a = 1;\n";
        let result = process(source, Priority::Readability);
        assert_eq!(result.improved_code, source);
        assert!(result.improvements.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.metrics.int(metric::LINES_OF_CODE), Some(1));
    }
}
