//! Notice-log features: detector alert volume and severity for one host
//! in one window.

use crate::error::EngineError;
use crate::features::stats::{Frequency, Summary};
use crate::features::{opt_f64, opt_str, FeatureExtractor, FeatureMap};
use crate::window::WindowSnapshot;

const KIND: &str = "notice";

fn severity_rank(severity: &str) -> Option<f64> {
    match severity.to_ascii_lowercase().as_str() {
        "low" => Some(1.0),
        "medium" => Some(2.0),
        "high" => Some(3.0),
        _ => None,
    }
}

pub struct NoticeExtractor;

impl FeatureExtractor for NoticeExtractor {
    fn name(&self) -> &'static str {
        KIND
    }

    fn extract(&self, window: &WindowSnapshot) -> Result<FeatureMap, EngineError> {
        let records = window.records(KIND);
        if records.is_empty() {
            return Ok(FeatureMap::new());
        }
        let count = records.len() as f64;

        let note_freq: Frequency<&str> =
            records.iter().filter_map(|r| opt_str(r, "note")).collect();

        let severity: Summary = records
            .iter()
            .filter_map(|r| opt_str(r, "severity"))
            .filter_map(severity_rank)
            .collect();

        let ts_summary: Summary = records
            .iter()
            .filter_map(|r| opt_f64(r, "ts"))
            .filter(|ts| *ts > 0.0)
            .collect();

        let mut features = FeatureMap::new();
        features.insert("notice_count".into(), count);
        features.insert("notice_type_entropy".into(), note_freq.entropy());
        features.insert("average_severity".into(), severity.mean());
        features.insert("notice_rate".into(), count / window.window_secs());
        features.insert("notice_ts_variance".into(), ts_summary.variance());
        Ok(features)
    }
}
