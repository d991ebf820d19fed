//! SSL-log features: protocol hygiene and fingerprint diversity of one
//! host's TLS activity in one window.

use crate::error::EngineError;
use crate::features::stats::Frequency;
use crate::features::{opt_bool, opt_str, FeatureExtractor, FeatureMap};
use crate::window::WindowSnapshot;

const KIND: &str = "ssl";

const OUTDATED_VERSIONS: &[&str] = &["SSLv2", "SSLv3"];
const WEAK_CIPHER_MARKERS: &[&str] = &["RC4", "DES", "3DES", "MD5"];

pub struct SslExtractor;

impl FeatureExtractor for SslExtractor {
    fn name(&self) -> &'static str {
        KIND
    }

    fn extract(&self, window: &WindowSnapshot) -> Result<FeatureMap, EngineError> {
        let records = window.records(KIND);
        if records.is_empty() {
            return Ok(FeatureMap::new());
        }
        let total = records.len() as f64;

        let outdated = records
            .iter()
            .filter_map(|r| opt_str(r, "version"))
            .filter(|v| OUTDATED_VERSIONS.contains(v))
            .count() as f64;

        let weak_ciphers = records
            .iter()
            .filter_map(|r| opt_str(r, "cipher"))
            .filter(|c| WEAK_CIPHER_MARKERS.iter().any(|m| c.contains(m)))
            .count() as f64;

        // absent cipher/version fields count as one shared blank value, so
        // a window of bare entries still reads as uniform
        let cipher_freq: Frequency<&str> = records
            .iter()
            .map(|r| opt_str(r, "cipher").unwrap_or(""))
            .collect();
        let version_freq: Frequency<&str> = records
            .iter()
            .map(|r| opt_str(r, "version").unwrap_or(""))
            .collect();

        let ja3_freq: Frequency<&str> =
            records.iter().filter_map(|r| opt_str(r, "ja3")).collect();

        let self_signed = records
            .iter()
            .filter(|r| {
                let issuer = opt_str(r, "issuer");
                issuer.is_some() && issuer == opt_str(r, "subject")
            })
            .count() as f64;

        let handshake_failures = records
            .iter()
            .filter(|r| opt_bool(r, "established") == Some(false))
            .count() as f64;

        let mut features = FeatureMap::new();
        features.insert("outdated_ssl_versions".into(), outdated);
        features.insert("weak_ciphers".into(), weak_ciphers);
        features.insert("cipher_suite_entropy".into(), cipher_freq.entropy());
        features.insert("ja3_entropy".into(), ja3_freq.entropy());
        features.insert("self_signed_cert_count".into(), self_signed);
        features.insert("handshake_failure_rate".into(), handshake_failures / total);
        features.insert("ssl_version_entropy".into(), version_freq.entropy());
        Ok(features)
    }
}
