//! Structured logging: tracing to stdout, optionally as ndjson.

mod format;

pub use format::{RunSummary, StructuredLogger};
