//! Rewrites calls to known-dangerous callables to their safe substitutes.

use super::{Edit, Rewrite, SourceTree, TreePass};
use crate::error::{PolishError, Result};
use crate::model::{OutcomeKind, RuleOutcome};
use crate::security::PatternSet;

/// Replaces the callee of every call site that has a substitute in the
/// pattern set (`eval(x)` becomes `safe_eval(x)`).
///
/// The substitute must exist at runtime; this pass only renames the callee.
pub struct UnsafeCallPass {
    patterns: &'static PatternSet,
}

impl UnsafeCallPass {
    pub fn new(patterns: &'static PatternSet) -> Self {
        Self { patterns }
    }
}

impl TreePass for UnsafeCallPass {
    fn name(&self) -> &'static str {
        "unsafe-calls"
    }

    fn plan(&self, tree: &SourceTree) -> Result<Rewrite> {
        let sites = self
            .patterns
            .call_sites(tree.source(), tree.tree(), tree.grammar())
            .map_err(|message| PolishError::Rewrite { message })?;

        let mut rewrite = Rewrite::default();
        for site in sites {
            let Some(substitute) = site.substitute else {
                continue;
            };
            rewrite.push(
                Edit::replace(site.callee_range, substitute),
                RuleOutcome::new(
                    OutcomeKind::UnsafeCallReplaced,
                    format!(
                        "Replaced {}() with {}() on line {}",
                        site.callee, substitute, site.location.line
                    ),
                ),
            );
        }
        Ok(rewrite)
    }
}
