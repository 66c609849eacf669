//! Serializable run configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PolishError, Result};
use crate::model::Priority;

/// Caller-facing settings for a batch run.
///
/// # Example YAML
///
/// ```yaml
/// priority: security
/// languages: [py, js]
/// exclude:
///   - "vendor/**"
///   - "**/generated_*.py"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Which rewrite passes are eligible.
    #[serde(default)]
    pub priority: Priority,

    /// Extensions (without dot) to process. Empty means all files.
    /// Files with other extensions are copied through untouched.
    #[serde(default)]
    pub languages: Vec<String>,

    /// Glob patterns, relative to the input root, of paths to skip entirely.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Compute results and diffs without writing the output tree.
    #[serde(default)]
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new(priority: Priority) -> Self {
        Self {
            priority,
            ..Default::default()
        }
    }

    /// Restricts processing to the given extensions.
    pub fn with_languages(
        mut self,
        languages: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Adds exclude patterns.
    pub fn with_exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// True if files with this extension should go through a processor.
    pub fn processes_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.languages.is_empty()
            || self
                .languages
                .iter()
                .any(|l| l.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Loads a config, choosing the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            other => Err(PolishError::InvalidConfig(format!(
                "Unsupported config format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml::from_str(&content).map_err(|e| {
            PolishError::InvalidConfig(format!("Failed to parse YAML config: {}", e))
        })
    }

    /// Load config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            PolishError::InvalidConfig(format!("Failed to parse JSON config: {}", e))
        })
    }

    /// Save config to a YAML file.
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(|e| {
            PolishError::InvalidConfig(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PolishError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file {}: {}", path.display(), e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.priority, Priority::Readability);
        assert!(config.processes_extension("anything"));
        assert!(!config.dry_run);
    }

    #[test]
    fn test_language_allow_list() {
        let config = RunConfig::default().with_languages(["py", ".JS"]);
        assert!(config.processes_extension("PY"));
        assert!(config.processes_extension(".js"));
        assert!(!config.processes_extension("ts"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.yaml");
        let config = RunConfig::new(Priority::Security)
            .with_languages(["py"])
            .with_exclude(["vendor/**"]);
        config.to_yaml(&path).unwrap();

        assert_eq!(RunConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_json_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"priority": "performance"}"#).unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.priority, Priority::Performance);
        assert!(config.languages.is_empty());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = RunConfig::load("settings.ini");
        assert!(matches!(result, Err(PolishError::InvalidConfig(_))));
    }
}
