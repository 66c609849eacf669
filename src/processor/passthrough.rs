use super::Processor;
use crate::model::{ImprovementResult, Priority};
use std::path::Path;

/// Fallback for files with no registered processor: returns the text unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl Processor for PassThrough {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn process(&self, path: &Path, source: &str, _priority: Priority) -> ImprovementResult {
        ImprovementResult::unchanged(path, source, "Generic")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metric;

    #[test]
    fn test_round_trip_for_every_priority() {
        let source = "eval(x)\npassword = 'hunter22'\n\tmessy   \n";
        for priority in Priority::ALL {
            let result = PassThrough.process(Path::new("notes.txt"), source, priority);
            assert_eq!(result.improved_code, source);
            assert!(result.improvements.is_empty());
            assert!(result.warnings.is_empty());
            assert_eq!(result.metrics.int(metric::LINES_OF_CODE), Some(3));
        }
    }
}
