//! Zeek JSON log reader: one JSON object per line, one file per log kind.

use std::path::Path;

use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::record::Record;

/// Outcome of reading one log file: the usable records plus the number of
/// lines rejected along the way.
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub records: Vec<Record>,
    pub skipped: usize,
}

/// Reads one Zeek log in ndjson form, tagging every record with `kind`.
/// Blank lines are ignored; lines that fail to parse or lack the identity
/// and timestamp fields are counted in `skipped` and left behind.
pub async fn read_log_file(path: &Path, kind: &str) -> std::io::Result<ParsedLog> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut parsed = ParsedLog::default();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(kind, error = %e, "skipping unparseable log line");
                parsed.skipped += 1;
                continue;
            }
        };
        match Record::from_json(kind, fields) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                warn!(kind, error = %e, "skipping unusable log entry");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}
