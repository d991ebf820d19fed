//! Pipeline wiring: window store, evictor, extraction worker pool, and
//! aggregator behind one handle with a clean shutdown path.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::EngineError;
use crate::features::{default_extractors, FeatureAggregator, FeatureExtractor};
use crate::record::Record;
use crate::window::{Evictor, OutputChannel, WindowStore};

/// Outcome of one ingest call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub appended: usize,
    pub rejected: usize,
}

pub struct Pipeline {
    store: Arc<WindowStore>,
    channel: Arc<OutputChannel>,
    aggregator: Arc<FeatureAggregator>,
    extractors: Arc<Vec<Box<dyn FeatureExtractor>>>,
    workers: usize,
    flush_interval: Duration,
    shutting_down: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Pipeline {
    /// Wires the full default extractor set.
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_extractors(config, default_extractors())
    }

    pub fn with_extractors(
        config: &PipelineConfig,
        extractors: Vec<Box<dyn FeatureExtractor>>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store: Arc::new(WindowStore::new(config.window.window_ms())),
            channel: Arc::new(OutputChannel::new(config.window.queue_capacity)),
            aggregator: Arc::new(FeatureAggregator::new()),
            extractors: Arc::new(extractors),
            workers: config.extraction.workers.max(1),
            flush_interval: Duration::from_secs(config.window.flush_interval_secs),
            shutting_down: AtomicBool::new(false),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the evictor and the extraction workers. Call once, from
    /// inside the runtime.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().expect("lock");
        let evictor = Evictor::new(
            Arc::clone(&self.store),
            Arc::clone(&self.channel),
            self.flush_interval,
        );
        tasks.push(tokio::spawn(evictor.run(self.shutdown_tx.subscribe())));
        for worker in 0..self.workers {
            tasks.push(tokio::spawn(extraction_worker(
                worker,
                Arc::clone(&self.channel),
                Arc::clone(&self.aggregator),
                Arc::clone(&self.extractors),
            )));
        }
        info!(workers = self.workers, "pipeline started");
    }

    /// Appends a batch of records from one log kind. Invalid records are
    /// skipped and counted, never aborting the batch. Refused outright once
    /// shutdown has begun, so drained windows cannot resurrect.
    pub fn ingest(&self, kind: &str, records: Vec<Record>) -> Result<IngestStats, EngineError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(EngineError::ShuttingDown);
        }
        let mut stats = IngestStats::default();
        for record in records {
            match self.store.append(record) {
                Ok(()) => stats.appended += 1,
                Err(e) => {
                    stats.rejected += 1;
                    warn!(kind, error = %e, "record rejected");
                }
            }
        }
        Ok(stats)
    }

    /// Stops the eviction schedule, drains every remaining window through
    /// the extractors, and waits for the workers to finish. The aggregator
    /// is final once this returns.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.shutdown_tx.send(true);
        let tasks = {
            let mut guard = self.tasks.lock().expect("lock");
            mem::take(&mut *guard)
        };
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "pipeline task failed");
            }
        }
        info!(
            vectors = self.aggregator.len(),
            dropped_windows = self.channel.dropped_windows(),
            "pipeline stopped"
        );
    }

    pub fn aggregator(&self) -> &FeatureAggregator {
        &self.aggregator
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    pub fn channel(&self) -> &OutputChannel {
        &self.channel
    }
}

async fn extraction_worker(
    worker: usize,
    channel: Arc<OutputChannel>,
    aggregator: Arc<FeatureAggregator>,
    extractors: Arc<Vec<Box<dyn FeatureExtractor>>>,
) {
    while let Some(window) = channel.take().await {
        for extractor in extractors.iter() {
            match extractor.extract(&window) {
                Ok(features) if features.is_empty() => {}
                Ok(features) => {
                    if let Err(e) =
                        aggregator.merge(&window.identity, window.window_start_ms, features)
                    {
                        warn!(worker, extractor = extractor.name(), error = %e, "merge rejected");
                    }
                }
                Err(e) => {
                    warn!(
                        worker,
                        extractor = extractor.name(),
                        identity = %window.identity,
                        window_start_ms = window.window_start_ms,
                        error = %e,
                        "feature extraction failed"
                    );
                }
            }
        }
    }
    debug!(worker, "extraction worker done");
}
