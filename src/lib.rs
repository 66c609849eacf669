//! # codepolish
//!
//! Batch source-code improvement: parse each file, apply priority-gated
//! rewrite passes, scan for risky patterns, and collect metrics.
//!
//! This crate provides:
//! - Per-language processors behind a shared registry
//! - Structural rewrites on tree-sitter syntax trees (docstrings, unsafe calls)
//! - Lexical and structural security scanning
//! - Line metrics and per-function cyclomatic complexity
//! - A batch orchestrator with dry-run diffs and Markdown/JSON reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codepolish::prelude::*;
//! use std::path::Path;
//!
//! let config = RunConfig::new(Priority::Security).with_exclude(["vendor/**"]);
//! let summary = improve_codebase(
//!     Path::new("./input"),
//!     Path::new("./output"),
//!     &config,
//!     &ProcessorRegistry::new(),
//! )?;
//!
//! println!("{}", summary.diff);
//! # Ok::<(), codepolish::error::PolishError>(())
//! ```
//!
//! ## Single Files
//!
//! ```rust
//! use codepolish::prelude::*;
//! use std::path::Path;
//!
//! let processor = PythonProcessor::new();
//! let result = processor.process(
//!     Path::new("app.py"),
//!     "def main():\n    return 1\n",
//!     Priority::Readability,
//! );
//!
//! assert!(result.improved_code.contains("\"\"\"TODO: Add function description\"\"\""));
//! ```
//!
//! ## Supported Languages
//!
//! - Python (`.py`, `.pyi`): full structural support
//! - JavaScript/TypeScript (`.js`, `.jsx`, `.mjs`, `.cjs`, `.ts`, `.tsx`): lexical only
//! - Everything else passes through unchanged

pub mod batch;
pub mod config;
pub mod diff;
pub mod error;
pub mod lang;
pub mod metrics;
pub mod model;
pub mod processor;
pub mod report;
pub mod security;
pub mod summary;
pub mod transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::batch::{BatchSummary, FilePreview, improve_codebase};
    pub use crate::config::RunConfig;
    pub use crate::diff::{DiffSummary, colorized_diff, unified_diff};
    pub use crate::error::{PolishError, Result};
    pub use crate::lang::{Language, Python};
    pub use crate::metrics::{analyze_complexity, complexity_rank, compute_metrics};
    pub use crate::model::{
        ComplexityEntry, Finding, ImprovementResult, Location, MetricValue, Metrics,
        OutcomeKind, Priority, RuleOutcome,
    };
    pub use crate::processor::{
        PassThrough, Processor, ProcessorRegistry, PythonProcessor, ScriptProcessor,
    };
    pub use crate::report::{ReportPaths, render_json, render_markdown, write_reports};
    pub use crate::security::PatternSet;
    pub use crate::summary::{CodebaseStats, LanguageStats, analyze_codebase, detect_language};
    pub use crate::transform::{
        DocstringPass, Edit, Gate, PassPlan, SourceTree, StylePass, TextPass, TreePass,
        UnsafeCallPass,
    };
}

pub use prelude::*;
