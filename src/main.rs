//! netsift entrypoint: read the configured Zeek logs, window records per
//! originating host, extract features over closed windows, write one CSV.
//! Ctrl+C stops ingestion early; whatever has arrived is still drained,
//! extracted, and exported.

use netsift::{
    config::PipelineConfig,
    engine::{IngestStats, Pipeline},
    export::export_csv,
    logging::{RunSummary, StructuredLogger},
    parser::read_log_file,
    record::Record,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

static STOP: AtomicBool = AtomicBool::new(false);

/// Records handed to the pipeline per ingest call, so an interrupt lands
/// between batches instead of behind a whole file.
const INGEST_BATCH: usize = 4096;

async fn ingest_log(pipeline: &Pipeline, dir: &std::path::Path, kind: &str) -> IngestStats {
    let path = dir.join(format!("{kind}.log"));
    if !path.exists() {
        info!(kind, path = ?path, "log file absent, skipping");
        return IngestStats::default();
    }
    let parsed = match read_log_file(&path, kind).await {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(kind, error = %e, "log file unreadable");
            return IngestStats::default();
        }
    };
    if parsed.skipped > 0 {
        warn!(kind, skipped = parsed.skipped, "unusable lines skipped");
    }

    let mut totals = IngestStats::default();
    let mut records = parsed.records;
    while !records.is_empty() && !STOP.load(Ordering::Relaxed) {
        let take = records.len().min(INGEST_BATCH);
        let batch: Vec<Record> = records.drain(..take).collect();
        match pipeline.ingest(kind, batch) {
            Ok(stats) => {
                totals.appended += stats.appended;
                totals.rejected += stats.rejected;
            }
            Err(e) => {
                warn!(kind, error = %e, "ingest refused");
                break;
            }
        }
    }
    info!(
        kind,
        appended = totals.appended,
        rejected = totals.rejected,
        "log ingested"
    );
    totals
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("NETSIFT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = PipelineConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(
        window_secs = config.window.window_secs,
        workers = config.extraction.workers,
        log_dir = ?config.ingest.log_dir,
        "netsift starting (Ctrl+C to stop early)"
    );

    let _ = ctrlc::set_handler(|| {
        STOP.store(true, Ordering::Relaxed);
    });

    let pipeline = Arc::new(Pipeline::new(&config));
    pipeline.start();

    let mut readers = Vec::new();
    for kind in config.ingest.log_types.clone() {
        let pipeline = Arc::clone(&pipeline);
        let dir = config.ingest.log_dir.clone();
        readers.push(tokio::spawn(async move {
            ingest_log(&pipeline, &dir, &kind).await
        }));
    }

    let mut totals = IngestStats::default();
    for reader in readers {
        match reader.await {
            Ok(stats) => {
                totals.appended += stats.appended;
                totals.rejected += stats.rejected;
            }
            Err(e) => warn!(error = %e, "reader task failed"),
        }
    }

    if STOP.load(Ordering::Relaxed) {
        info!("interrupted, draining what arrived");
    }

    pipeline.shutdown().await;

    let table = pipeline.aggregator().snapshot();
    export_csv(&config.export.output_path, &table)?;

    let output = config.export.output_path.display().to_string();
    let summary = RunSummary {
        ts: chrono::Utc::now().to_rfc3339(),
        identities: table.len(),
        vectors: table.values().map(|windows| windows.len()).sum(),
        windows_dropped: pipeline.channel().dropped_windows(),
        records_appended: totals.appended,
        records_rejected: totals.rejected,
        output: &output,
    };
    StructuredLogger::emit_json(&summary, &mut std::io::stdout());

    info!("netsift finished");
    Ok(())
}
