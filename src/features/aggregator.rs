//! Concurrent feature aggregation keyed by (identity, window start).

use crate::error::EngineError;
use crate::features::FeatureMap;
use crate::window::WindowKey;
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Ordered snapshot of the store: identity → window start → feature map.
pub type FeatureTable = BTreeMap<String, BTreeMap<u64, FeatureMap>>;

/// Accumulates per-window feature vectors from many concurrent extractors.
/// Each (identity, window) pair has its own entry, so merges for different
/// windows never contend and merges for the same window serialize on the
/// entry guard.
#[derive(Debug, Default)]
pub struct FeatureAggregator {
    store: DashMap<WindowKey, FeatureMap>,
}

impl FeatureAggregator {
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Merge one extractor's contribution into the vector for
    /// (identity, window). Names already present are overwritten, names the
    /// submission does not mention are preserved.
    pub fn merge(
        &self,
        identity: &str,
        window_start_ms: u64,
        features: FeatureMap,
    ) -> Result<(), EngineError> {
        if identity.is_empty() {
            return Err(EngineError::invalid_submission("empty identity"));
        }
        if features.is_empty() {
            return Err(EngineError::invalid_submission(format!(
                "empty feature map for window {window_start_ms}"
            )));
        }
        let key = WindowKey::new(identity, window_start_ms);
        self.store.entry(key).or_default().extend(features);
        Ok(())
    }

    /// Owned, ordered, point-in-time copy of every vector. The copy shares
    /// nothing with live state, so later merges cannot tear it.
    pub fn snapshot(&self) -> FeatureTable {
        let mut table = FeatureTable::new();
        for entry in self.store.iter() {
            table
                .entry(entry.key().identity.clone())
                .or_default()
                .insert(entry.key().window_start_ms, entry.value().clone());
        }
        table
    }

    /// Drop all state, isolating one extraction run from the next.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Number of (identity, window) vectors currently held.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
