//! Result log operations: JSONL parsing, resume ledger, append-only sink, cached reader.

mod ledger;
mod reader;
mod sink;

pub use ledger::{SkipSet, load_skip_set};
pub use reader::{Records, ResultCache};
pub use sink::ResultSink;

use std::path::{Path, PathBuf};

use crate::ClassificationResult;

/// Errors reading a persisted result log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: malformed result record: {source}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse JSONL content into records. Blank lines are ignored; any other bad line is an error.
pub fn parse_results(path: &Path, content: &str) -> Result<Vec<ClassificationResult>, LogError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str(l).map_err(|source| LogError::MalformedLine {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })
        })
        .collect()
}

/// Read and parse a whole log file.
pub fn read_results(path: &Path) -> Result<Vec<ClassificationResult>, LogError> {
    let content = std::fs::read_to_string(path).map_err(|source| LogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_results(path, &content)
}

/// One JSON line (with trailing newline) for `result`.
pub fn to_line(result: &ClassificationResult) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(result)?;
    line.push('\n');
    Ok(line)
}
