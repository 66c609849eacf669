//! Markdown and JSON reports for a batch run.

use crate::batch::BatchSummary;
use crate::error::Result;
use crate::summary::CodebaseStats;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TITLE: &str = "# Code Improvement Report";

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    overview: Option<&'a CodebaseStats>,
    summary: &'a BatchSummary,
}

/// Paths of the files written by [`write_reports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// Renders the Markdown report.
pub fn render_markdown(
    summary: &BatchSummary,
    stats: Option<&CodebaseStats>,
    generated: NaiveDateTime,
) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "{TITLE}\n");
    let _ = writeln!(md, "*Generated on {}*\n", generated.format("%Y-%m-%d %H:%M:%S"));

    if let Some(stats) = stats {
        md.push_str(&render_overview(stats));
    }

    md.push_str("## Detailed Review\n\n");
    let _ = writeln!(md, "{}\n", summary.diff);

    for result in &summary.results {
        let _ = writeln!(md, "### File: `{}`\n", result.file_path.display());

        if !result.metrics.is_empty() {
            md.push_str("#### Code Metrics\n");
            md.push_str("| Metric | Value |\n");
            md.push_str("|--------|-------|\n");
            for (name, value) in result.metrics.iter() {
                let _ = writeln!(md, "| {name} | {value} |");
            }
            md.push('\n');
        }

        if result.improvements.is_empty() {
            md.push_str("No improvements suggested.\n");
        } else {
            md.push_str("#### Suggested Improvements\n");
            for outcome in &result.improvements {
                let _ = writeln!(md, "- {outcome}");
            }
        }

        if !result.warnings.is_empty() {
            md.push_str("\n#### Warnings\n");
            for warning in &result.warnings {
                let _ = writeln!(md, "- {warning}");
            }
        }

        md.push_str("\n---\n\n");
    }

    md
}

fn render_overview(stats: &CodebaseStats) -> String {
    let mut md = String::from("## Codebase Overview\n\n");
    let _ = writeln!(md, "- **Total Files Analyzed**: {}", stats.total_files);
    let _ = writeln!(md, "- **Source Directory**: `{}`\n", stats.input_directory.display());
    md.push_str("### Language Distribution\n");
    md.push_str("| Language | Files | Lines of Code |\n");
    md.push_str("|----------|-------|---------------|\n");
    for (lang, lang_stats) in &stats.languages {
        let _ = writeln!(md, "| {} | {} | {} |", lang, lang_stats.files, lang_stats.loc);
    }
    md.push_str("\n---\n\n");
    md
}

/// Renders the JSON report.
pub fn render_json(
    summary: &BatchSummary,
    stats: Option<&CodebaseStats>,
    generated: NaiveDateTime,
) -> Result<String> {
    let report = JsonReport {
        generated: generated.format("%Y-%m-%dT%H:%M:%S").to_string(),
        overview: stats,
        summary,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Writes `report_<timestamp>.md` and `report_<timestamp>.json` into `dir`.
pub fn write_reports(
    dir: &Path,
    summary: &BatchSummary,
    stats: Option<&CodebaseStats>,
    generated: NaiveDateTime,
) -> Result<ReportPaths> {
    fs::create_dir_all(dir)?;
    let stamp = generated.format("%Y%m%d_%H%M%S");
    let paths = ReportPaths {
        markdown: dir.join(format!("report_{stamp}.md")),
        json: dir.join(format!("report_{stamp}.json")),
    };

    fs::write(&paths.markdown, render_markdown(summary, stats, generated))?;
    fs::write(&paths.json, render_json(summary, stats, generated)?)?;
    info!("Reports written to {}", dir.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Finding, ImprovementResult, OutcomeKind, RuleOutcome};
    use crate::summary::LanguageStats;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 6))
            .unwrap()
    }

    fn sample() -> BatchSummary {
        let mut changed =
            ImprovementResult::unchanged(Path::new("src/app.py"), "x = 1\n", "Python");
        changed.improvements.push(RuleOutcome::new(
            OutcomeKind::DocstringAdded,
            "Added docstring to function 'main'",
        ));
        changed.warnings.push(Finding::new("eval", "Found eval() usage - potential security risk"));

        BatchSummary {
            results: vec![
                changed,
                ImprovementResult::unchanged(Path::new("README.txt"), "hi\n", "Generic"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_markdown_sections() {
        let md = render_markdown(&sample(), None, timestamp());
        assert!(md.starts_with("# Code Improvement Report\n"));
        assert!(md.contains("*Generated on 2024-03-09 14:05:06*"));
        assert!(!md.contains("Codebase Overview"));
        assert!(md.contains("### File: `src/app.py`"));
        assert!(md.contains("| lines_of_code | 1 |"));
        assert!(md.contains("- Added docstring to function 'main'"));
        assert!(md.contains("#### Warnings\n- Found eval() usage - potential security risk"));
        assert!(md.contains("No improvements suggested."));
    }

    #[test]
    fn test_markdown_overview() {
        let mut stats = CodebaseStats {
            total_files: 2,
            input_directory: PathBuf::from("input"),
            ..Default::default()
        };
        stats.languages.insert(
            "Python".to_string(),
            LanguageStats {
                files: 1,
                loc: 1,
                files_list: vec![PathBuf::from("src/app.py")],
            },
        );

        let md = render_markdown(&sample(), Some(&stats), timestamp());
        assert!(md.contains("- **Total Files Analyzed**: 2"));
        assert!(md.contains("| Python | 1 | 1 |"));
    }

    #[test]
    fn test_write_reports() {
        let dir = TempDir::new().unwrap();
        let paths =
            write_reports(&dir.path().join("reports"), &sample(), None, timestamp()).unwrap();

        assert!(paths.markdown.ends_with("report_20240309_140506.md"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(json["generated"], "2024-03-09T14:05:06");
        assert_eq!(json["summary"]["results"][0]["file_path"], "src/app.py");
        assert_eq!(json["summary"]["results"][0]["improvements"][0]["kind"], "docstring-added");
        assert!(json.get("overview").is_none());
    }
}
