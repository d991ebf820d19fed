//! SSH-log features: outbound session volume, credential-guessing signals,
//! and algorithm hygiene for one host in one window. Session duration and
//! byte totals come from the conn log joined on `uid`.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::features::stats::{Frequency, Summary};
use crate::features::{opt_bool, opt_f64, opt_str, opt_u64, FeatureExtractor, FeatureMap};
use crate::record::Record;
use crate::window::WindowSnapshot;

const KIND: &str = "ssh";

const WEAK_ALGORITHMS: &[&str] = &[
    "arcfour",
    "arcfour128",
    "arcfour256",
    "3des-cbc",
    "blowfish-cbc",
    "des-cbc",
    "hmac-md5",
    "hmac-md5-96",
    "hmac-sha1-96",
    "diffie-hellman-group1-sha1",
];

const STANDARD_SSH_PORT: u64 = 22;

fn uses_weak_algorithm(record: &Record) -> bool {
    ["cipher_alg", "mac_alg", "kex_alg"].iter().any(|field| {
        opt_str(record, field)
            .map(|alg| WEAK_ALGORITHMS.contains(&alg.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    })
}

pub struct SshExtractor;

impl FeatureExtractor for SshExtractor {
    fn name(&self) -> &'static str {
        KIND
    }

    fn extract(&self, window: &WindowSnapshot) -> Result<FeatureMap, EngineError> {
        let records = window.records(KIND);
        if records.is_empty() {
            return Ok(FeatureMap::new());
        }
        let total = records.len() as f64;

        // conn join for duration/bytes; first entry wins for duplicate uids
        let mut conn_by_uid: HashMap<&str, &Record> = HashMap::new();
        for conn in window.records("conn") {
            if let Some(uid) = opt_str(conn, "uid") {
                conn_by_uid.entry(uid).or_insert(conn);
            }
        }

        let dest_ips: Frequency<&str> = records
            .iter()
            .filter_map(|r| opt_str(r, "id.resp_h"))
            .collect();

        let auth_successes = records
            .iter()
            .filter(|r| opt_bool(r, "auth_success").unwrap_or(false))
            .count() as f64;

        let server_freq: Frequency<&str> = records
            .iter()
            .filter_map(|r| opt_str(r, "server"))
            .collect();

        let weak_algo_count = records.iter().filter(|r| uses_weak_algorithm(r)).count() as f64;

        let auth_attempts: Summary = records
            .iter()
            .map(|r| {
                let success = opt_bool(r, "auth_success").unwrap_or(false);
                let attempts = opt_u64(r, "auth_attempts").unwrap_or(0);
                // Zeek leaves auth_attempts at 0 on some failed logins;
                // count those as one try
                if !success && attempts == 0 {
                    1.0
                } else {
                    attempts as f64
                }
            })
            .collect();

        let dest_ports: Frequency<u64> = records
            .iter()
            .filter_map(|r| opt_u64(r, "id.resp_p"))
            .filter(|port| *port > 0)
            .collect();

        let non_standard_ports = records
            .iter()
            .filter(|r| opt_u64(r, "id.resp_p").unwrap_or(0) != STANDARD_SSH_PORT)
            .count() as f64;

        let ts_summary: Summary = records
            .iter()
            .filter_map(|r| opt_f64(r, "ts"))
            .filter(|ts| *ts > 0.0)
            .collect();

        let durations: Summary = records
            .iter()
            .filter_map(|r| opt_str(r, "uid"))
            .filter_map(|uid| conn_by_uid.get(uid))
            .map(|conn| opt_f64(conn, "duration").unwrap_or(0.0))
            .collect();

        let total_bytes: f64 = records
            .iter()
            .filter_map(|r| opt_str(r, "uid"))
            .filter_map(|uid| conn_by_uid.get(uid))
            .map(|conn| {
                opt_f64(conn, "orig_bytes").unwrap_or(0.0)
                    + opt_f64(conn, "resp_bytes").unwrap_or(0.0)
            })
            .sum();

        let cipher_freq: Frequency<&str> = records
            .iter()
            .filter_map(|r| opt_str(r, "cipher_alg"))
            .collect();

        let hassh_freq: Frequency<&str> = records
            .iter()
            .filter_map(|r| opt_str(r, "hassh"))
            .collect();

        let mut features = FeatureMap::new();
        features.insert("ssh_outgoing_connections".into(), total);
        features.insert("ssh_unique_dest_ips".into(), dest_ips.unique() as f64);
        features.insert("ssh_auth_success_ratio".into(), auth_successes / total);
        features.insert(
            "ssh_server_software_entropy".into(),
            server_freq.entropy(),
        );
        features.insert("ssh_weak_algo_count".into(), weak_algo_count);
        features.insert("ssh_avg_auth_attempts".into(), auth_attempts.mean());
        features.insert("ssh_unique_dest_ports".into(), dest_ports.unique() as f64);
        features.insert("ssh_non_standard_port_count".into(), non_standard_ports);
        features.insert("ssh_ts_variance".into(), ts_summary.variance());
        features.insert("ssh_avg_duration".into(), durations.mean());
        features.insert("ssh_total_bytes".into(), total_bytes);
        features.insert("ssh_cipher_algo_entropy".into(), cipher_freq.entropy());
        features.insert("ssh_hassh_entropy".into(), hassh_freq.entropy());
        Ok(features)
    }
}
