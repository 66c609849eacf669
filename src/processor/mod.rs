//! Per-language processors and the registry that dispatches to them.
//!
//! A processor turns one file's text into an [`ImprovementResult`]. Processing
//! is stateless: every call owns its own tree, so a single processor can be
//! shared across threads and invoked concurrently.

mod passthrough;
mod python;
mod registry;
mod script;

pub use passthrough::PassThrough;
pub use python::PythonProcessor;
pub use registry::ProcessorRegistry;
pub use script::ScriptProcessor;

use crate::model::{ImprovementResult, Priority};
use std::path::Path;

/// A language-specific source improver.
pub trait Processor: Send + Sync {
    /// Returns the name of the processor.
    fn name(&self) -> &'static str;

    /// Processes one file. Never fails: problems are reported in the result.
    fn process(&self, path: &Path, source: &str, priority: Priority) -> ImprovementResult;
}

/// Decodes file bytes as UTF-8, dropping invalid sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => rest = &after[len..],
                    None => return out,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_utf8() {
        assert_eq!(decode_lossy("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn test_decode_skips_invalid_bytes() {
        assert_eq!(decode_lossy(b"ab\xffcd\xfe"), "abcd");
    }

    #[test]
    fn test_decode_truncated_sequence() {
        assert_eq!(decode_lossy(b"ok\xe2\x82"), "ok");
    }
}
