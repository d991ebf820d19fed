//! Pipeline configuration: windowing, extraction workers, log ingest,
//! CSV export, logging.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Windowing and eviction parameters
    pub window: WindowConfig,
    /// Extraction worker pool
    pub extraction: ExtractionConfig,
    /// Zeek logs to ingest
    pub ingest: IngestConfig,
    /// Feature CSV export
    pub export: ExportConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window size (seconds)
    pub window_secs: u64,
    /// Eviction sweep interval (seconds)
    pub flush_interval_secs: u64,
    /// Capacity of the closed-window queue
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Extraction workers draining the queue
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory holding Zeek ndjson logs, one `<kind>.log` per kind
    pub log_dir: PathBuf,
    /// Log kinds to ingest
    pub log_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Feature CSV destination
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            extraction: ExtractionConfig::default(),
            ingest: IngestConfig::default(),
            export: ExportConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            flush_interval_secs: 30,
            queue_capacity: 1024,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("zeek-logs"),
            log_types: ["conn", "dns", "http", "ssl", "notice", "ssh"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("features.csv"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl WindowConfig {
    pub fn window_ms(&self) -> u64 {
        self.window_secs * 1000
    }
}

impl PipelineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<PipelineConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}
