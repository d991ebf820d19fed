//! Engine error taxonomy. No variant is fatal to the pipeline: invalid
//! records are skipped, full queues are counted as dropped windows, and
//! extractor failures are isolated to their (extractor, window) pair.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("invalid feature submission: {reason}")]
    InvalidFeatureSubmission { reason: String },

    #[error(
        "output queue full, dropping window for {identity} (start: {window_start_ms}, records: {records})"
    )]
    QueueFull {
        identity: String,
        window_start_ms: u64,
        records: usize,
    },

    #[error("missing required field '{field}' in {kind} record")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("pipeline is shutting down, new records are rejected")]
    ShuttingDown,
}

impl EngineError {
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        EngineError::InvalidRecord {
            reason: reason.into(),
        }
    }

    pub fn invalid_submission(reason: impl Into<String>) -> Self {
        EngineError::InvalidFeatureSubmission {
            reason: reason.into(),
        }
    }
}
