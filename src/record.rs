//! Log records: one parsed Zeek ndjson entry, keyed by originating host.

use crate::error::EngineError;
use serde_json::Value;

/// Field carrying the originating host in Zeek logs.
pub const IDENTITY_FIELD: &str = "id.orig_h";
/// Field carrying the event timestamp (fractional epoch seconds).
pub const TS_FIELD: &str = "ts";

/// One log entry. `ts` follows the Zeek convention of fractional epoch
/// seconds; window math happens in integer milliseconds via [`Record::ts_ms`].
/// `fields` is the full JSON object, consumed only by feature extractors.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub identity: String,
    pub ts: f64,
    pub kind: String,
    pub fields: Value,
}

impl Record {
    pub fn new(identity: impl Into<String>, ts: f64, kind: impl Into<String>, fields: Value) -> Self {
        Self {
            identity: identity.into(),
            ts,
            kind: kind.into(),
            fields,
        }
    }

    /// Build a record from a parsed log line, pulling the identity and
    /// timestamp out of the entry itself.
    pub fn from_json(kind: &str, fields: Value) -> Result<Self, EngineError> {
        let identity = fields
            .get(IDENTITY_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::invalid_record(format!("missing '{IDENTITY_FIELD}'")))?;
        if identity.is_empty() {
            return Err(EngineError::invalid_record(format!("empty '{IDENTITY_FIELD}'")));
        }
        let ts = fields
            .get(TS_FIELD)
            .and_then(Value::as_f64)
            .ok_or_else(|| EngineError::invalid_record(format!("missing '{TS_FIELD}'")))?;
        Ok(Self::new(identity.to_owned(), ts, kind, fields))
    }

    /// Timestamp in epoch milliseconds, truncated the way Zeek tooling does.
    pub fn ts_ms(&self) -> u64 {
        (self.ts * 1000.0) as u64
    }
}
