//! netsift — Windowed per-identity feature extraction over Zeek network telemetry.
//!
//! Modular structure:
//! - [`window`] — Per-identity time windows, eviction, bounded handoff queue
//! - [`features`] — Per-log-kind feature extractors and the merge aggregator
//! - [`engine`] — Pipeline lifecycle: ingest, workers, drain-on-shutdown
//! - [`parser`] — Zeek ndjson log reader
//! - [`export`] — Feature table CSV writer
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod features;
pub mod logging;
pub mod parser;
pub mod record;
pub mod window;

pub use config::PipelineConfig;
pub use engine::{IngestStats, Pipeline};
pub use error::EngineError;
pub use features::{FeatureAggregator, FeatureExtractor, FeatureMap, FeatureTable};
pub use logging::StructuredLogger;
pub use parser::{read_log_file, ParsedLog};
pub use record::Record;
pub use window::{OutputChannel, WindowKey, WindowSnapshot, WindowStore};
