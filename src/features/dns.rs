//! DNS-log features: query volume, domain spread, and the shape of the
//! query/response traffic for one host in one window.

use crate::error::EngineError;
use crate::features::stats::{Frequency, Summary};
use crate::features::{opt_f64, opt_str, opt_u64, FeatureExtractor, FeatureMap};
use crate::record::Record;
use crate::window::WindowSnapshot;
use serde_json::Value;
use std::collections::HashMap;

const KIND: &str = "dns";

pub struct DnsExtractor;

impl FeatureExtractor for DnsExtractor {
    fn name(&self) -> &'static str {
        KIND
    }

    fn extract(&self, window: &WindowSnapshot) -> Result<FeatureMap, EngineError> {
        let records = window.records(KIND);
        if records.is_empty() {
            return Ok(FeatureMap::new());
        }

        let query_freq = records.len() as f64;

        let domain_freq: Frequency<&str> =
            records.iter().filter_map(|r| opt_str(r, "query")).collect();
        let qtype_freq: Frequency<&str> = records
            .iter()
            .filter_map(|r| opt_str(r, "qtype_name"))
            .collect();
        let query_len_freq: Frequency<usize> = records
            .iter()
            .filter_map(|r| opt_str(r, "query"))
            .map(str::len)
            .collect();

        let nxdomain = records
            .iter()
            .filter(|r| opt_str(r, "rcode_name") == Some("NXDOMAIN"))
            .count() as f64;

        let mut subdomain_levels = 0usize;
        let mut domain_count = 0usize;
        for record in records {
            if let Some(query) = opt_str(record, "query") {
                // sub.example.com -> 2 levels
                subdomain_levels += query.split('.').count().saturating_sub(1);
                domain_count += 1;
            }
        }
        let subdomain_level_avg = if domain_count > 0 {
            subdomain_levels as f64 / domain_count as f64
        } else {
            0.0
        };

        let mut features = FeatureMap::new();
        features.insert("dns_query_freq".into(), query_freq);
        features.insert("dns_unique_domains".into(), domain_freq.unique() as f64);
        features.insert("domain_entropy".into(), domain_freq.entropy());
        features.insert("qtype_entropy".into(), qtype_freq.entropy());
        features.insert("nxdomain_ratio".into(), nxdomain / query_freq);
        features.insert("query_length_entropy".into(), query_len_freq.entropy());
        features.insert("subdomain_level_avg".into(), subdomain_level_avg);
        features.insert(
            "query_response_time_avg".into(),
            query_response_time_avg(records),
        );
        Ok(features)
    }
}

/// Pair queries with their responses by (uid, trans_id) and average the
/// positive time gaps. An entry with a non-empty `answers` array is a
/// response; entries missing either key are left out of the pairing.
fn query_response_time_avg(records: &[Record]) -> f64 {
    let mut pending: HashMap<(String, u64), f64> = HashMap::new();
    let mut gaps = Summary::default();
    for record in records {
        let Some(uid) = opt_str(record, "uid") else {
            continue;
        };
        let Some(trans_id) = opt_u64(record, "trans_id") else {
            continue;
        };
        let ts = opt_f64(record, "ts").unwrap_or(0.0);
        let key = (uid.to_owned(), trans_id);
        let is_response = record
            .fields
            .get("answers")
            .and_then(Value::as_array)
            .map(|answers| !answers.is_empty())
            .unwrap_or(false);
        if is_response {
            if let Some(query_ts) = pending.remove(&key) {
                let gap = ts - query_ts;
                if gap > 0.0 {
                    gaps.add(gap);
                }
            }
        } else {
            pending.insert(key, ts);
        }
    }
    gaps.mean()
}
