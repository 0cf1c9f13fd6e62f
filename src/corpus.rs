//! Line-delimited corpus loading. One non-blank line is one record; there
//! is no chunking or merging across lines.

use std::path::Path;

use crate::error::{ReviewError, ReviewResult};
use crate::models::Record;

/// Read `path` as UTF-8 and return one record per non-blank line.
pub fn load_corpus(path: &Path) -> ReviewResult<Vec<Record>> {
    let content = std::fs::read_to_string(path).map_err(|source| ReviewError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = parse_corpus(&content);
    tracing::info!(
        "Loaded {} records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Split text into trimmed records, skipping blank lines and keeping order.
pub fn parse_corpus(content: &str) -> Vec<Record> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Record::new)
        .collect()
}
