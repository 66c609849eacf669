//! Language and line-count overview of an input tree.

use crate::error::{PolishError, Result};
use crate::processor::decode_lossy;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("py", "Python"),
    ("js", "JavaScript"),
    ("java", "Java"),
    ("cpp", "C++"),
    ("c", "C"),
    ("cs", "C#"),
    ("rb", "Ruby"),
    ("go", "Go"),
    ("php", "PHP"),
    ("ts", "TypeScript"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("rs", "Rust"),
    ("sh", "Shell"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("json", "JSON"),
    ("xml", "XML"),
];

/// Returns the display language for a file, or `Unknown`.
pub fn detect_language(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "Unknown";
    };
    EXTENSION_LANGUAGES
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map_or("Unknown", |&(_, lang)| lang)
}

/// Per-language totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageStats {
    pub files: usize,
    pub loc: usize,
    pub files_list: Vec<PathBuf>,
}

/// Totals for a whole input tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodebaseStats {
    pub total_files: usize,
    pub input_directory: PathBuf,
    pub languages: BTreeMap<String, LanguageStats>,
}

impl CodebaseStats {
    /// Total lines across all languages.
    pub fn total_loc(&self) -> usize {
        self.languages.values().map(|s| s.loc).sum()
    }
}

/// Walks `root` and tallies files and lines per language.
///
/// Unreadable files count as zero lines; entries that cannot be walked are
/// skipped. Symlinked files are counted, symlinked directories are not entered.
pub fn analyze_codebase(root: &Path) -> Result<CodebaseStats> {
    if !root.is_dir() {
        return Err(PolishError::InvalidConfig(format!("Not a directory: {}", root.display())));
    }
    let mut stats = CodebaseStats {
        input_directory: root.to_path_buf(),
        ..Default::default()
    };

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && !entry.path().is_dir());
        if !is_file {
            continue;
        }
        let path = entry.path();
        let loc = std::fs::read(path)
            .map(|bytes| decode_lossy(&bytes).lines().count())
            .unwrap_or(0);
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();

        let lang = stats
            .languages
            .entry(detect_language(path).to_string())
            .or_default();
        lang.files += 1;
        lang.loc += loc;
        lang.files_list.push(relative);
        stats.total_files += 1;
    }

    Ok(stats)
}
