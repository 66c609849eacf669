//! Batch orchestration: walk an input tree, improve every file, mirror the
//! results into an output tree.

use crate::config::RunConfig;
use crate::diff::{DiffSummary, colorized_diff, unified_diff};
use crate::error::{PolishError, Result};
use crate::model::{Finding, IO_FAILURE, ImprovementResult};
use crate::processor::{ProcessorRegistry, decode_lossy};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Unified diff of one file whose text changed, kept in dry-run mode.
#[derive(Debug, Clone, Serialize)]
pub struct FilePreview {
    pub path: PathBuf,
    pub diff: String,
    #[serde(skip)]
    pub colored: String,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// One result per processed file, ordered by relative path.
    pub results: Vec<ImprovementResult>,
    /// Aggregate line changes across all processed files.
    pub diff: DiffSummary,
    /// Files outside the language allow-list copied through untouched.
    pub copied: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previews: Vec<FilePreview>,
}

impl BatchSummary {
    /// Number of files whose text changed.
    pub fn modified(&self) -> usize {
        self.diff.files_changed
    }

    /// Total warnings across all results.
    pub fn warning_count(&self) -> usize {
        self.results.iter().map(|r| r.warnings.len()).sum()
    }

    pub fn result_for(&self, path: impl AsRef<Path>) -> Option<&ImprovementResult> {
        let path = path.as_ref();
        self.results.iter().find(|r| r.file_path == path)
    }
}

struct Workload {
    process: Vec<PathBuf>,
    copy: Vec<PathBuf>,
    failed: Vec<ImprovementResult>,
}

/// Improves every file under `input` and writes the results below `output`.
///
/// `input` may be a directory or a `.zip` archive. Unless `config.dry_run` is
/// set, `output` is removed and recreated first; an output that is the input
/// or one of its ancestors is rejected before anything is removed. Per-file
/// I/O failures become results carrying an `io-failure` warning and do not
/// stop the run.
pub fn improve_codebase(
    input: &Path,
    output: &Path,
    config: &RunConfig,
    registry: &ProcessorRegistry,
) -> Result<BatchSummary> {
    let extracted = if is_archive(input) {
        Some(extract_archive(input)?)
    } else {
        None
    };
    let root = extracted.as_ref().map_or(input, |dir| dir.path());

    if !root.is_dir() {
        return Err(PolishError::InvalidConfig(format!(
            "Input is neither a directory nor a zip archive: {}",
            input.display()
        )));
    }
    if extracted.is_none() && canonical(root).starts_with(canonical(output)) {
        return Err(PolishError::InvalidConfig(format!(
            "Output directory {} must not be the input or contain it",
            output.display()
        )));
    }

    let excludes = build_excludes(&config.exclude)?;

    if !config.dry_run {
        prepare_output(output)?;
    }

    let workload = collect(root, output, &excludes, config);
    info!(
        "Processing {} file(s) from {} ({} copied through, {} unreadable)",
        workload.process.len(),
        input.display(),
        workload.copy.len(),
        workload.failed.len()
    );

    let processed: Vec<(ImprovementResult, Option<String>)> = workload
        .process
        .par_iter()
        .map(|relative| process_file(root, relative, config, registry))
        .collect();

    let mut summary = BatchSummary::default();
    summary.results.extend(workload.failed);

    for relative in &workload.copy {
        if config.dry_run {
            summary.copied += 1;
            continue;
        }
        match copy_through(&root.join(relative), &output.join(relative)) {
            Ok(()) => summary.copied += 1,
            Err(e) => {
                warn!("Could not copy {}: {}", relative.display(), e);
                summary.results.push(ImprovementResult::file_failure(
                    relative,
                    format!("could not copy file: {e}"),
                ));
            }
        }
    }

    for (mut result, original) in processed {
        let Some(original) = original else {
            summary.results.push(result);
            continue;
        };

        let change = DiffSummary::from_diff(&original, &result.improved_code);
        summary.diff.merge(&change);

        if config.dry_run {
            if change.files_changed > 0 {
                let path = &result.file_path;
                summary.previews.push(FilePreview {
                    path: path.clone(),
                    diff: unified_diff(&original, &result.improved_code, path),
                    colored: colorized_diff(&original, &result.improved_code, path),
                });
            }
        } else {
            let target = output.join(&result.file_path);
            if let Err(e) = write_output(&target, &result.improved_code) {
                warn!("Could not write {}: {}", result.file_path.display(), e);
                result
                    .warnings
                    .push(Finding::new(IO_FAILURE, format!("could not write file: {e}")));
            }
        }
        summary.results.push(result);
    }

    summary.results.sort_by(|a, b| a.file_path.cmp(&b.file_path));

    info!(
        "Batch complete: {} file(s) processed, {}, {} warning(s)",
        summary.results.len(),
        summary.diff,
        summary.warning_count()
    );

    Ok(summary)
}

/// Reads, decodes and processes one file. The original text is returned
/// alongside the result unless the file could not be read.
fn process_file(
    root: &Path,
    relative: &Path,
    config: &RunConfig,
    registry: &ProcessorRegistry,
) -> (ImprovementResult, Option<String>) {
    let bytes = match fs::read(root.join(relative)) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read {}: {}", relative.display(), e);
            return (ImprovementResult::io_failure(relative, &e), None);
        }
    };

    let source = decode_lossy(&bytes);
    let processor = registry.resolve_path(relative);
    let result = processor.process(relative, &source, config.priority);
    debug!(
        "{} via {}: {} improvement(s), {} warning(s)",
        relative.display(),
        processor.name(),
        result.improvements.len(),
        result.warnings.len()
    );
    (result, Some(source))
}

/// Splits the tree under `root` into files to process and files to copy.
///
/// Symlinked files (dangling ones included) are listed like regular files.
/// Symlinked directories are not descended into. Walk errors become failure
/// results.
fn collect(root: &Path, output: &Path, excludes: &GlobSet, config: &RunConfig) -> Workload {
    let mut workload = Workload {
        process: Vec::new(),
        copy: Vec::new(),
        failed: Vec::new(),
    };
    let output = canonical(output);
    let relative_to_root = |path: &Path| path.strip_prefix(root).unwrap_or(path).to_path_buf();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            if entry.file_type().is_dir() && canonical(entry.path()) == output {
                return false;
            }
            !excludes.is_match(relative_to_root(entry.path()))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let relative = e.path().map(|p| relative_to_root(p)).unwrap_or_default();
                warn!("Could not walk {}: {}", relative.display(), e);
                workload.failed.push(ImprovementResult::file_failure(
                    &relative,
                    format!("could not read file: {e}"),
                ));
                continue;
            }
        };

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && !entry.path().is_dir());
        if !is_file {
            continue;
        }

        let relative = relative_to_root(entry.path());
        let ext = relative.extension().and_then(|e| e.to_str()).unwrap_or("");
        if config.processes_extension(ext) {
            workload.process.push(relative);
        } else {
            workload.copy.push(relative);
        }
    }

    workload.process.sort();
    workload
}

fn copy_through(source: &Path, target: &Path) -> Result<()> {
    ensure_parent(target)?;
    fs::copy(source, target)?;
    Ok(())
}

fn write_output(target: &Path, text: &str) -> Result<()> {
    ensure_parent(target)?;
    fs::write(target, text)?;
    Ok(())
}

fn build_excludes(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.trim_end_matches('/'))?);
    }
    Ok(builder.build()?)
}

fn prepare_output(output: &Path) -> Result<()> {
    if output.exists() {
        debug!("Removing existing output directory {}", output.display());
        fs::remove_dir_all(output)?;
    }
    fs::create_dir_all(output)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn is_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

/// Extracts a zip archive into a fresh temporary directory.
fn extract_archive(archive_path: &Path) -> Result<TempDir> {
    let dir = TempDir::new()?;
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => dir.path().join(path),
            None => {
                warn!("Skipping archive entry with unsafe path: {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            ensure_parent(&outpath)?;
            let mut outfile = File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;
        }
    }

    debug!("Extracted {} entries from {}", archive.len(), archive_path.display());
    Ok(dir)
}

/// Absolute, symlink-resolved form of `path`, falling back to the absolute
/// form for paths that do not exist yet.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutcomeKind, Priority};
    use std::io::Write;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_excludes_prune_directories() {
        let input = TempDir::new().unwrap();
        write(input.path(), "keep.py", "x = 1\n");
        write(input.path(), "vendor/lib.py", "y = 2\n");
        write(input.path(), "gen/out_1.py", "z = 3\n");

        let patterns = ["vendor".to_string(), "gen/out_*.py".to_string()];
        let excludes = build_excludes(&patterns).unwrap();
        let config = RunConfig::default();
        let workload = collect(input.path(), Path::new("/nonexistent"), &excludes, &config);
        assert_eq!(workload.process, vec![PathBuf::from("keep.py")]);
        assert!(workload.failed.is_empty());
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        assert!(matches!(build_excludes(&["a[".to_string()]), Err(PolishError::Glob(_))));
    }

    #[test]
    fn test_output_inside_input_is_skipped() {
        let input = TempDir::new().unwrap();
        write(input.path(), "a.py", "def f():\n    return 1\n");
        let output = input.path().join("out");

        let registry = ProcessorRegistry::new();
        let summary =
            improve_codebase(input.path(), &output, &RunConfig::default(), &registry).unwrap();
        assert_eq!(summary.results.len(), 1);
        assert!(output.join("a.py").exists());
    }

    #[test]
    fn test_same_input_and_output_rejected() {
        let input = TempDir::new().unwrap();
        write(input.path(), "a.py", "x = 1\n");
        let registry = ProcessorRegistry::new();
        let result = improve_codebase(input.path(), input.path(), &RunConfig::default(), &registry);
        assert!(matches!(result, Err(PolishError::InvalidConfig(_))));
        assert!(input.path().join("a.py").exists());
    }

    #[test]
    fn test_output_containing_input_rejected_before_cleanup() {
        let scratch = TempDir::new().unwrap();
        let input = scratch.path().join("src");
        write(&input, "a.py", "x = 1\n");

        let registry = ProcessorRegistry::new();
        let result = improve_codebase(&input, scratch.path(), &RunConfig::default(), &registry);
        assert!(matches!(result, Err(PolishError::InvalidConfig(_))));
        assert_eq!(fs::read_to_string(input.join("a.py")).unwrap(), "x = 1\n");
    }

    #[test]
    fn test_invalid_exclude_leaves_output_alone() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write(input.path(), "a.py", "x = 1\n");
        write(output.path(), "keep.txt", "old");

        let config = RunConfig::default().with_exclude(["a["]);
        let registry = ProcessorRegistry::new();
        let result = improve_codebase(input.path(), output.path(), &config, &registry);
        assert!(matches!(result, Err(PolishError::Glob(_))));
        assert!(output.path().join("keep.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_processed() {
        let scratch = TempDir::new().unwrap();
        let input = scratch.path().join("in");
        let output = scratch.path().join("out");
        write(scratch.path(), "shared/lib.py", "def f():\n    return 1\n");
        write(scratch.path(), "shared/notes.txt", "notes\n");
        fs::create_dir_all(&input).unwrap();
        std::os::unix::fs::symlink(scratch.path().join("shared/lib.py"), input.join("lib.py"))
            .unwrap();
        std::os::unix::fs::symlink(scratch.path().join("shared"), input.join("linked_dir"))
            .unwrap();

        let config = RunConfig::default().with_languages(["py"]);
        let registry = ProcessorRegistry::new();
        let summary = improve_codebase(&input, &output, &config, &registry).unwrap();

        assert_eq!(summary.results.len(), 1);
        assert!(summary.result_for("lib.py").unwrap().has_outcome(OutcomeKind::DocstringAdded));
        assert!(output.join("lib.py").is_file());
        assert!(!output.join("linked_dir").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_copy_through_becomes_failure_result() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write(input.path(), "a.py", "x = 1\n");
        std::os::unix::fs::symlink(input.path().join("gone.txt"), input.path().join("b.txt"))
            .unwrap();

        let config = RunConfig::default().with_languages(["py"]);
        let summary =
            improve_codebase(input.path(), output.path(), &config, &ProcessorRegistry::new())
                .unwrap();

        assert_eq!(summary.copied, 0);
        let failed = summary.result_for("b.txt").unwrap();
        assert!(failed.improved_code.is_empty());
        assert_eq!(failed.warnings.len(), 1);
        assert_eq!(failed.warnings[0].rule, IO_FAILURE);
        assert!(failed.warnings[0].message.starts_with("could not copy file: "));
        assert!(output.path().join("a.py").exists());
    }

    #[test]
    fn test_zip_input() {
        let scratch = TempDir::new().unwrap();
        let archive_path = scratch.path().join("code.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&archive_path).unwrap());
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("pkg/mod.py", options).unwrap();
            zip.write_all(b"def f():\n    return 1\n").unwrap();
            zip.finish().unwrap();
        }
        let output = scratch.path().join("out");

        let summary = improve_codebase(
            &archive_path,
            &output,
            &RunConfig::new(Priority::Readability),
            &ProcessorRegistry::new(),
        )
        .unwrap();

        let result = summary.result_for("pkg/mod.py").unwrap();
        assert!(result.has_outcome(OutcomeKind::DocstringAdded));
        let written = fs::read_to_string(output.join("pkg/mod.py")).unwrap();
        assert!(written.contains("\"\"\"TODO: Add function description\"\"\""));
    }
}
