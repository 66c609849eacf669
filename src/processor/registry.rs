use super::{PassThrough, Processor, PythonProcessor, ScriptProcessor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Maps lower-cased file extensions to processors.
///
/// Built once and read-only afterwards, so it can be shared across worker
/// threads. Unregistered extensions resolve to [`PassThrough`].
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
    fallback: PassThrough,
}

impl ProcessorRegistry {
    /// Creates a registry with the built-in processors.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(["py", "pyi"], Arc::new(PythonProcessor::new()));
        registry.register(
            ["js", "jsx", "mjs", "cjs", "ts", "tsx"],
            Arc::new(ScriptProcessor::new()),
        );
        registry
    }

    /// Creates a registry where every extension resolves to the fallback.
    pub fn empty() -> Self {
        Self {
            processors: HashMap::new(),
            fallback: PassThrough,
        }
    }

    /// Registers `processor` for each extension. Later registrations win.
    pub fn register<I, S>(&mut self, extensions: I, processor: Arc<dyn Processor>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extensions {
            let key = normalize(ext.as_ref());
            if let Some(previous) = self.processors.insert(key.clone(), Arc::clone(&processor)) {
                debug!(
                    "Extension .{} moved from {} to {}",
                    key,
                    previous.name(),
                    processor.name()
                );
            }
        }
    }

    /// Finds the processor for an extension (with or without leading dot).
    pub fn resolve(&self, ext: &str) -> &dyn Processor {
        self.processors
            .get(&normalize(ext))
            .map(|p| p.as_ref())
            .unwrap_or(&self.fallback)
    }

    /// Finds the processor for a file path by its extension.
    pub fn resolve_path(&self, path: &Path) -> &dyn Processor {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.resolve(ext)
    }

    /// Returns true if the extension has an explicit registration.
    pub fn is_registered(&self, ext: &str) -> bool {
        self.processors.contains_key(&normalize(ext))
    }

    /// (extension, processor name) pairs, sorted by extension.
    pub fn entries(&self) -> Vec<(&str, &'static str)> {
        let mut entries: Vec<_> = self
            .processors
            .iter()
            .map(|(ext, p)| (ext.as_str(), p.name()))
            .collect();
        entries.sort();
        entries
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}
