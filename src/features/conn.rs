//! Connection-log features: volume, fan-out, protocol mix, and completion
//! behavior of one host's connections in one window.

use crate::error::EngineError;
use crate::features::stats::{Frequency, Summary};
use crate::features::{opt_f64, require_str, require_u64, FeatureExtractor, FeatureMap};
use crate::window::WindowSnapshot;

const KIND: &str = "conn";

struct ConnEntry<'a> {
    resp_port: u64,
    state: &'a str,
    resp_host: &'a str,
    orig_host: &'a str,
    proto: &'a str,
    duration: Option<f64>,
    orig_bytes: Option<f64>,
    resp_bytes: Option<f64>,
    ts: Option<f64>,
}

pub struct ConnExtractor;

impl FeatureExtractor for ConnExtractor {
    fn name(&self) -> &'static str {
        KIND
    }

    fn extract(&self, window: &WindowSnapshot) -> Result<FeatureMap, EngineError> {
        let records = window.records(KIND);
        if records.is_empty() {
            return Ok(FeatureMap::new());
        }

        // conn entries without their core tuple cannot be scored at all
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            entries.push(ConnEntry {
                resp_port: require_u64(record, KIND, "id.resp_p")?,
                state: require_str(record, KIND, "conn_state")?,
                resp_host: require_str(record, KIND, "id.resp_h")?,
                orig_host: require_str(record, KIND, "id.orig_h")?,
                proto: require_str(record, KIND, "proto")?,
                duration: opt_f64(record, "duration"),
                orig_bytes: opt_f64(record, "orig_bytes"),
                resp_bytes: opt_f64(record, "resp_bytes"),
                ts: opt_f64(record, "ts"),
            });
        }

        let conn_freq = entries.len() as f64;

        let port_freq: Frequency<u64> = entries.iter().map(|e| e.resp_port).collect();
        let state_freq: Frequency<&str> = entries.iter().map(|e| e.state).collect();
        let dest_ip_freq: Frequency<&str> = entries.iter().map(|e| e.resp_host).collect();
        let src_ip_freq: Frequency<&str> = entries.iter().map(|e| e.orig_host).collect();

        let duration_summary: Summary = entries.iter().filter_map(|e| e.duration).collect();

        // per-connection orig/resp ratio, capped at 100 before averaging
        let mut ratio_total = 0.0;
        let mut ratio_count = 0u64;
        for entry in &entries {
            if let (Some(orig), Some(resp)) = (entry.orig_bytes, entry.resp_bytes) {
                ratio_total += (orig / (resp + 1.0)).min(100.0);
                ratio_count += 1;
            }
        }
        let bytes_in_out_ratio = if ratio_count > 0 {
            ratio_total / ratio_count as f64
        } else {
            0.0
        };

        let tcp = entries.iter().filter(|e| e.proto == "tcp").count() as f64;
        let udp = entries.iter().filter(|e| e.proto == "udp").count() as f64;
        let icmp = entries.iter().filter(|e| e.proto == "icmp").count() as f64;
        let proto_total = tcp + udp + icmp + 1.0;

        let incomplete = entries
            .iter()
            .filter(|e| matches!(e.state, "S0" | "S1" | "REJ"))
            .count() as f64;
        let complete = entries.iter().filter(|e| e.state == "SF").count() as f64;

        let ts_summary: Summary = entries
            .iter()
            .filter_map(|e| e.ts)
            .filter(|ts| *ts >= 0.0)
            .collect();

        let mut features = FeatureMap::new();
        features.insert("conn_freq".into(), conn_freq);
        features.insert("unique_ports".into(), port_freq.unique() as f64);
        features.insert("conn_duration_avg".into(), duration_summary.mean());
        features.insert("port_entropy".into(), port_freq.entropy());
        features.insert("conn_state_entropy".into(), state_freq.entropy());
        features.insert("bytes_in_out_ratio".into(), bytes_in_out_ratio);
        features.insert("dest_ip_entropy".into(), dest_ip_freq.entropy());
        features.insert("source_ip_entropy".into(), src_ip_freq.entropy());
        features.insert("udp_ratio".into(), udp / proto_total);
        features.insert("tcp_ratio".into(), tcp / proto_total);
        features.insert("icmp_ratio".into(), icmp / proto_total);
        features.insert("conn_rate".into(), conn_freq / window.window_secs());
        features.insert("incomplete_conn_ratio".into(), incomplete / (complete + 1.0));
        features.insert("conn_ts_variance".into(), ts_summary.variance());
        Ok(features)
    }
}
