//! Rewrite passes and the priority-gated plan that runs them.
//!
//! Tree passes inspect a [`SourceTree`] and propose edits; the plan applies
//! them, producing the next tree. Text passes run afterwards over the
//! regenerated source. A failing pass leaves its input untouched and is
//! reported as a `pass-failure` finding.

pub mod docstring;
pub mod safety;
pub mod style;
pub mod tree;

pub use docstring::DocstringPass;
pub use safety::UnsafeCallPass;
pub use style::StylePass;
pub use tree::{Edit, SourceTree};

use crate::error::Result;
use crate::model::{Finding, Priority, RuleOutcome};
use tracing::{debug, warn};

/// Edits proposed by a tree pass, with one outcome per change.
#[derive(Debug, Default)]
pub struct Rewrite {
    pub edits: Vec<Edit>,
    pub outcomes: Vec<RuleOutcome>,
}

impl Rewrite {
    pub fn push(&mut self, edit: Edit, outcome: RuleOutcome) {
        self.edits.push(edit);
        self.outcomes.push(outcome);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// A structural pass over a parsed tree.
pub trait TreePass: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Computes the edits this pass wants to make.
    fn plan(&self, tree: &SourceTree) -> Result<Rewrite>;
}

/// The result of a text pass. Outcomes are empty when the text is unchanged.
#[derive(Debug)]
pub struct TextRewrite {
    pub text: String,
    pub outcomes: Vec<RuleOutcome>,
}

/// A pass over regenerated source text.
pub trait TextPass: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, text: &str) -> Result<TextRewrite>;
}

/// The set of priorities a pass is eligible under.
#[derive(Debug, Clone, Copy)]
pub struct Gate(&'static [Priority]);

impl Gate {
    pub const fn only(priorities: &'static [Priority]) -> Self {
        Self(priorities)
    }

    pub fn admits(&self, priority: Priority) -> bool {
        self.0.contains(&priority)
    }
}

/// Output of running the tree stage of a plan.
pub struct TreeStage {
    pub tree: SourceTree,
    pub outcomes: Vec<RuleOutcome>,
    pub diagnostics: Vec<Finding>,
}

/// Output of running the text stage of a plan.
pub struct TextStage {
    pub text: String,
    pub outcomes: Vec<RuleOutcome>,
    pub diagnostics: Vec<Finding>,
}

/// Ordered (gate, pass) entries, evaluated once per file.
#[derive(Default)]
pub struct PassPlan {
    tree_passes: Vec<(Gate, Box<dyn TreePass>)>,
    text_passes: Vec<(Gate, Box<dyn TextPass>)>,
}

impl PassPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tree pass.
    pub fn tree_pass(mut self, gate: Gate, pass: impl TreePass + 'static) -> Self {
        self.tree_passes.push((gate, Box::new(pass)));
        self
    }

    /// Appends a text pass.
    pub fn text_pass(mut self, gate: Gate, pass: impl TextPass + 'static) -> Self {
        self.text_passes.push((gate, Box::new(pass)));
        self
    }

    /// Names of the passes eligible under `priority`, in execution order.
    pub fn eligible(&self, priority: Priority) -> Vec<&'static str> {
        let tree = self
            .tree_passes
            .iter()
            .filter(|(gate, _)| gate.admits(priority))
            .map(|(_, pass)| pass.name());
        let text = self
            .text_passes
            .iter()
            .filter(|(gate, _)| gate.admits(priority))
            .map(|(_, pass)| pass.name());
        tree.chain(text).collect()
    }

    /// Runs the eligible tree passes, threading ownership of the tree through each.
    pub fn run_tree(&self, mut tree: SourceTree, priority: Priority) -> TreeStage {
        let mut outcomes = Vec::new();
        let mut diagnostics = Vec::new();

        for (gate, pass) in &self.tree_passes {
            if !gate.admits(priority) {
                continue;
            }
            let rewritten = pass.plan(&tree).and_then(|rewrite| {
                if rewrite.is_empty() {
                    return Ok(None);
                }
                let next = tree.rewrite(rewrite.edits)?;
                Ok(Some((next, rewrite.outcomes)))
            });
            match rewritten {
                Ok(Some((next, pass_outcomes))) => {
                    debug!("Pass {} made {} change(s)", pass.name(), pass_outcomes.len());
                    tree = next;
                    outcomes.extend(pass_outcomes);
                }
                Ok(None) => {}
                Err(e) => diagnostics.push(pass_failure(pass.name(), &e)),
            }
        }

        TreeStage {
            tree,
            outcomes,
            diagnostics,
        }
    }

    /// Runs the eligible text passes in order.
    pub fn run_text(&self, mut text: String, priority: Priority) -> TextStage {
        let mut outcomes = Vec::new();
        let mut diagnostics = Vec::new();

        for (gate, pass) in &self.text_passes {
            if !gate.admits(priority) {
                continue;
            }
            match pass.apply(&text) {
                Ok(rewrite) => {
                    if rewrite.text != text {
                        text = rewrite.text;
                        outcomes.extend(rewrite.outcomes);
                    }
                }
                Err(e) => diagnostics.push(pass_failure(pass.name(), &e)),
            }
        }

        TextStage {
            text,
            outcomes,
            diagnostics,
        }
    }
}

fn pass_failure(name: &str, error: &crate::error::PolishError) -> Finding {
    warn!("Pass {} failed: {}", name, error);
    Finding::new("pass-failure", format!("pass '{name}' failed: {error}"))
}
