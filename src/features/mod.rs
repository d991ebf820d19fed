//! Per-window feature extraction: one extractor per log kind, each
//! producing a named numeric map over a closed window, merged into the
//! shared aggregator by the worker pool.

mod aggregator;
mod conn;
mod dns;
mod http;
mod notice;
mod ssh;
mod ssl;
pub mod stats;

pub use aggregator::{FeatureAggregator, FeatureTable};
pub use conn::ConnExtractor;
pub use dns::DnsExtractor;
pub use http::HttpExtractor;
pub use notice::NoticeExtractor;
pub use ssh::SshExtractor;
pub use ssl::SslExtractor;

use crate::error::EngineError;
use crate::record::Record;
use crate::window::WindowSnapshot;
use serde_json::Value;
use std::collections::HashMap;

/// Named numeric features computed by one extractor for one window.
pub type FeatureMap = HashMap<String, f64>;

/// A side-effect-free feature computation over one closed window. An empty
/// map means the extractor saw nothing of its kind and contributes nothing.
pub trait FeatureExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, window: &WindowSnapshot) -> Result<FeatureMap, EngineError>;
}

/// The full extractor set run over every evicted window.
pub fn default_extractors() -> Vec<Box<dyn FeatureExtractor>> {
    vec![
        Box::new(ConnExtractor),
        Box::new(DnsExtractor),
        Box::new(HttpExtractor),
        Box::new(SslExtractor),
        Box::new(NoticeExtractor),
        Box::new(SshExtractor),
    ]
}

/// Field the record cannot be scored without.
pub(crate) fn require_str<'a>(
    record: &'a Record,
    kind: &'static str,
    field: &'static str,
) -> Result<&'a str, EngineError> {
    record
        .fields
        .get(field)
        .and_then(Value::as_str)
        .ok_or(EngineError::MissingField { kind, field })
}

pub(crate) fn require_u64(
    record: &Record,
    kind: &'static str,
    field: &'static str,
) -> Result<u64, EngineError> {
    record
        .fields
        .get(field)
        .and_then(Value::as_u64)
        .ok_or(EngineError::MissingField { kind, field })
}

/// Optional string field; absent or empty reads as `None`.
pub(crate) fn opt_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record
        .fields
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub(crate) fn opt_f64(record: &Record, field: &str) -> Option<f64> {
    record.fields.get(field).and_then(Value::as_f64)
}

pub(crate) fn opt_u64(record: &Record, field: &str) -> Option<u64> {
    record.fields.get(field).and_then(Value::as_u64)
}

pub(crate) fn opt_bool(record: &Record, field: &str) -> Option<bool> {
    record.fields.get(field).and_then(Value::as_bool)
}
