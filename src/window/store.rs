//! Concurrent window store: identity → time-ordered open buckets.

use crate::error::EngineError;
use crate::record::Record;
use crate::window::bucket::{window_start, WindowBucket, WindowSnapshot};
use dashmap::DashMap;

/// Shared store of open windows. Appends to different identities proceed
/// on separate shards; the entry guard serializes work on one identity so
/// find-or-create-then-append is atomic.
pub struct WindowStore {
    windows: DashMap<String, Vec<WindowBucket>>,
    window_ms: u64,
}

impl WindowStore {
    pub fn new(window_ms: u64) -> Self {
        assert!(window_ms > 0, "window size must be > 0");
        Self {
            windows: DashMap::new(),
            window_ms,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Identities with at least one open bucket.
    pub fn identity_count(&self) -> usize {
        self.windows.len()
    }

    /// Open buckets across all identities.
    pub fn open_bucket_count(&self) -> usize {
        self.windows.iter().map(|entry| entry.value().len()).sum()
    }

    /// Place one record into its (identity, window) bucket, creating the
    /// bucket at its sorted position if this is the window's first record.
    pub fn append(&self, record: Record) -> Result<(), EngineError> {
        if record.identity.is_empty() {
            return Err(EngineError::invalid_record("empty identity"));
        }
        if !record.ts.is_finite() || record.ts < 0.0 {
            return Err(EngineError::invalid_record(format!(
                "unusable timestamp {}",
                record.ts
            )));
        }

        let ts_ms = record.ts_ms();
        let start = window_start(ts_ms, self.window_ms);
        let mut buckets = self.windows.entry(record.identity.clone()).or_default();
        let idx = match buckets.binary_search_by_key(&start, |b| b.window_start_ms) {
            Ok(found) => found,
            Err(insert_at) => {
                buckets.insert(insert_at, WindowBucket::new(ts_ms, self.window_ms));
                insert_at
            }
        };
        buckets[idx].push(record);
        Ok(())
    }

    /// Remove and return every bucket whose window ends at or before
    /// `cutoff_ms`, oldest first per identity. The closed buckets form a
    /// prefix of the sorted list, so the scan stops at the first open one.
    /// Identities left without buckets are dropped; the removal re-checks
    /// emptiness under the entry lock, so a racing append is never lost.
    pub fn evict_closed(&self, cutoff_ms: u64) -> Vec<WindowSnapshot> {
        let mut evicted = Vec::new();
        let identities: Vec<String> = self.windows.iter().map(|e| e.key().clone()).collect();
        for identity in identities {
            if let Some(mut entry) = self.windows.get_mut(&identity) {
                let buckets = entry.value_mut();
                let closed = buckets
                    .iter()
                    .take_while(|b| b.closed_by(cutoff_ms))
                    .count();
                for bucket in buckets.drain(..closed) {
                    evicted.push(bucket.into_snapshot(&identity));
                }
            }
            self.windows.remove_if(&identity, |_, buckets| buckets.is_empty());
        }
        evicted
    }

    /// Evict every remaining bucket regardless of age. Shares the removal
    /// routine with the timer path, so no bucket can be emitted twice.
    pub fn drain_all(&self) -> Vec<WindowSnapshot> {
        self.evict_closed(u64::MAX)
    }
}
