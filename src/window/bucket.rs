//! Window buckets: per-identity containers for the records of one
//! fixed-size time window, partitioned by record kind.

use crate::record::Record;
use std::collections::HashMap;

/// Aligns a millisecond timestamp to the start of its window.
pub fn window_start(ts_ms: u64, window_ms: u64) -> u64 {
    ts_ms - (ts_ms % window_ms)
}

/// Names one bucket: which identity, which window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKey {
    pub identity: String,
    pub window_start_ms: u64,
}

impl WindowKey {
    pub fn new(identity: impl Into<String>, window_start_ms: u64) -> Self {
        Self {
            identity: identity.into(),
            window_start_ms,
        }
    }
}

/// Open, mutable record container for one (identity, window) pair. Lives
/// inside the store until evicted; eviction consumes it into a
/// [`WindowSnapshot`].
#[derive(Debug)]
pub struct WindowBucket {
    pub window_start_ms: u64,
    pub window_ms: u64,
    records_by_kind: HashMap<String, Vec<Record>>,
}

impl WindowBucket {
    pub fn new(ts_ms: u64, window_ms: u64) -> Self {
        Self {
            window_start_ms: window_start(ts_ms, window_ms),
            window_ms,
            records_by_kind: HashMap::new(),
        }
    }

    /// Half-open membership check: [start, start + size).
    pub fn contains(&self, ts_ms: u64) -> bool {
        ts_ms >= self.window_start_ms && ts_ms - self.window_start_ms < self.window_ms
    }

    /// Whether the window ends at or before `cutoff_ms`.
    pub fn closed_by(&self, cutoff_ms: u64) -> bool {
        self.window_start_ms.saturating_add(self.window_ms) <= cutoff_ms
    }

    pub fn push(&mut self, record: Record) {
        self.records_by_kind
            .entry(record.kind.clone())
            .or_default()
            .push(record);
    }

    pub fn record_count(&self) -> usize {
        self.records_by_kind.values().map(Vec::len).sum()
    }

    /// Consume the bucket into an immutable snapshot for hand-off. Moving
    /// the contents out means an emitted window can neither be mutated nor
    /// emitted a second time.
    pub fn into_snapshot(self, identity: &str) -> WindowSnapshot {
        WindowSnapshot {
            identity: identity.to_owned(),
            window_start_ms: self.window_start_ms,
            window_ms: self.window_ms,
            records_by_kind: self.records_by_kind,
        }
    }
}

/// Evicted window contents, handed to feature extraction exactly once.
#[derive(Debug, Clone)]
pub struct WindowSnapshot {
    pub identity: String,
    pub window_start_ms: u64,
    pub window_ms: u64,
    records_by_kind: HashMap<String, Vec<Record>>,
}

impl WindowSnapshot {
    pub fn key(&self) -> WindowKey {
        WindowKey::new(self.identity.clone(), self.window_start_ms)
    }

    /// Records of one kind, empty slice when the window saw none.
    pub fn records(&self, kind: &str) -> &[Record] {
        self.records_by_kind
            .get(kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.records_by_kind.keys().map(String::as_str)
    }

    pub fn record_count(&self) -> usize {
        self.records_by_kind.values().map(Vec::len).sum()
    }

    /// Window length in seconds, for rate features.
    pub fn window_secs(&self) -> f64 {
        self.window_ms as f64 / 1000.0
    }
}
