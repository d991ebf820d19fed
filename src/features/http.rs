//! HTTP-log features: method and URI anomalies, error ratios, and header
//! diversity for one host in one window.

use crate::error::EngineError;
use crate::features::stats::{Frequency, Summary};
use crate::features::{opt_f64, opt_str, opt_u64, FeatureExtractor, FeatureMap};
use crate::window::WindowSnapshot;

const KIND: &str = "http";

const COMMON_METHODS: &[&str] = &["GET", "POST", "HEAD"];
const SUSPICIOUS_URI_PATTERNS: &[&str] = &[
    "..", "%00", "'", "--", ";", "&", "|", "%25", "%2e", "%252e", "%3b", "%27",
];

pub struct HttpExtractor;

impl FeatureExtractor for HttpExtractor {
    fn name(&self) -> &'static str {
        KIND
    }

    fn extract(&self, window: &WindowSnapshot) -> Result<FeatureMap, EngineError> {
        let records = window.records(KIND);
        if records.is_empty() {
            return Ok(FeatureMap::new());
        }
        let total = records.len() as f64;

        let rare_methods = records
            .iter()
            .filter_map(|r| opt_str(r, "method"))
            .filter(|m| !COMMON_METHODS.contains(m))
            .count() as f64;

        let uri_anomalies = records
            .iter()
            .filter_map(|r| opt_str(r, "uri"))
            .map(str::to_lowercase)
            .filter(|uri| SUSPICIOUS_URI_PATTERNS.iter().any(|p| uri.contains(p)))
            .count() as f64;

        let uri_len_summary: Summary = records
            .iter()
            .filter_map(|r| opt_str(r, "uri"))
            .map(|uri| uri.len() as f64)
            .collect();

        let codes: Vec<u64> = records
            .iter()
            .map(|r| opt_u64(r, "status_code").unwrap_or(0))
            .collect();
        let client_errors = codes.iter().filter(|&&c| (400..500).contains(&c)).count() as f64;
        let server_errors = codes.iter().filter(|&&c| (500..600).contains(&c)).count() as f64;
        let auth_errors = codes.iter().filter(|&&c| c == 401 || c == 403).count() as f64;

        let method_freq: Frequency<&str> =
            records.iter().filter_map(|r| opt_str(r, "method")).collect();
        let ua_freq: Frequency<&str> = records
            .iter()
            .filter_map(|r| opt_str(r, "user_agent"))
            .collect();
        let host_freq: Frequency<&str> =
            records.iter().filter_map(|r| opt_str(r, "host")).collect();

        let body_len_summary: Summary = records
            .iter()
            .filter_map(|r| opt_f64(r, "request_body_len"))
            .filter(|len| *len >= 0.0)
            .collect();

        let ts_summary: Summary = records
            .iter()
            .filter_map(|r| opt_f64(r, "ts"))
            .filter(|ts| *ts >= 0.0)
            .collect();

        let mut features = FeatureMap::new();
        features.insert("rare_http_methods".into(), rare_methods);
        features.insert("uri_anomalies".into(), uri_anomalies);
        features.insert("uri_length_variance".into(), uri_len_summary.variance());
        features.insert("client_error_ratio".into(), client_errors / total);
        features.insert("server_error_ratio".into(), server_errors / total);
        features.insert("auth_error_ratio".into(), auth_errors / total);
        features.insert("method_entropy".into(), method_freq.entropy());
        features.insert("user_agent_entropy".into(), ua_freq.entropy());
        features.insert("body_length_variance".into(), body_len_summary.variance());
        features.insert("host_entropy".into(), host_freq.entropy());
        features.insert("http_ts_variance".into(), ts_summary.variance());
        Ok(features)
    }
}
