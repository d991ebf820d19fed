//! Extractor and aggregator tests: reference statistics, per-kind feature
//! values over hand-built windows, and merge semantics.

use std::collections::HashSet;
use std::sync::Arc;

use netsift::export::FEATURE_COLUMNS;
use netsift::features::stats::{Frequency, Summary};
use netsift::features::{
    ConnExtractor, DnsExtractor, HttpExtractor, NoticeExtractor, SshExtractor, SslExtractor,
};
use netsift::window::WindowBucket;
use netsift::{FeatureAggregator, FeatureExtractor, Record, WindowSnapshot};
use serde_json::{json, Value};

const WINDOW_MS: u64 = 60_000;

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

/// Builds a one-window snapshot for "10.0.0.1" from (kind, fields) pairs.
/// Every entry gets the identity and a timestamp if the fields omit them.
fn window(entries: Vec<(&str, Value)>) -> WindowSnapshot {
    let mut bucket = WindowBucket::new(0, WINDOW_MS);
    for (kind, mut fields) in entries {
        let obj = fields.as_object_mut().expect("object fields");
        obj.entry("id.orig_h".to_string())
            .or_insert_with(|| json!("10.0.0.1"));
        obj.entry("ts".to_string()).or_insert_with(|| json!(1.0));
        let ts = fields.get("ts").and_then(Value::as_f64).unwrap_or(1.0);
        bucket.push(Record::new("10.0.0.1", ts, kind, fields));
    }
    bucket.into_snapshot("10.0.0.1")
}

#[test]
fn entropy_reference_values() {
    let uniform: Frequency<&str> = ["a", "a", "b", "b"].into_iter().collect();
    assert!(close(uniform.entropy(), 1.0));

    let spread: Frequency<&str> = ["a", "b", "c", "d"].into_iter().collect();
    assert!(close(spread.entropy(), 2.0));

    let single: Frequency<&str> = ["a"].into_iter().collect();
    assert_eq!(single.entropy(), 0.0);

    let empty: Frequency<&str> = Frequency::new();
    assert_eq!(empty.entropy(), 0.0);
    assert_eq!(empty.unique(), 0);
}

#[test]
fn variance_reference_values() {
    let summary: Summary = [1.0, 2.0, 3.0, 4.0].into_iter().collect();
    assert!(close(summary.mean(), 2.5));
    assert!(close(summary.variance(), 5.0 / 3.0));

    let single: Summary = [7.0].into_iter().collect();
    assert_eq!(single.variance(), 0.0);
    assert!(close(single.mean(), 7.0));

    let none = Summary::default();
    assert_eq!(none.mean(), 0.0);
    assert_eq!(none.variance(), 0.0);
}

#[test]
fn aggregator_merges_are_independent_per_name() {
    let aggregator = FeatureAggregator::new();
    aggregator
        .merge("10.0.0.1", 0, [("a".to_string(), 1.0)].into_iter().collect())
        .unwrap();
    aggregator
        .merge("10.0.0.1", 0, [("b".to_string(), 2.0)].into_iter().collect())
        .unwrap();
    aggregator
        .merge("10.0.0.1", 0, [("a".to_string(), 9.0)].into_iter().collect())
        .unwrap();

    let table = aggregator.snapshot();
    let features = &table["10.0.0.1"][&0];
    assert_eq!(features["a"], 9.0, "same name overwrites");
    assert_eq!(features["b"], 2.0, "other names survive");
    assert_eq!(aggregator.len(), 1);

    aggregator.clear();
    assert!(aggregator.is_empty());
    assert!(aggregator.snapshot().is_empty());
}

#[test]
fn aggregator_rejects_unusable_submissions() {
    let aggregator = FeatureAggregator::new();
    aggregator
        .merge("", 0, [("a".to_string(), 1.0)].into_iter().collect())
        .expect_err("empty identity");
    aggregator
        .merge("10.0.0.1", 0, Default::default())
        .expect_err("empty feature map");
    assert!(aggregator.is_empty());
}

#[test]
fn concurrent_disjoint_merges_all_survive() {
    let aggregator = Arc::new(FeatureAggregator::new());
    let writers = 8;
    let names_per_writer = 50;

    let mut handles = Vec::new();
    for w in 0..writers {
        let aggregator = Arc::clone(&aggregator);
        handles.push(std::thread::spawn(move || {
            for i in 0..names_per_writer {
                let value = (w * names_per_writer + i) as f64;
                let features = [(format!("f_{w}_{i}"), value)].into_iter().collect();
                aggregator.merge("10.0.0.1", 0, features).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let table = aggregator.snapshot();
    let features = &table["10.0.0.1"][&0];
    assert_eq!(
        features.len(),
        writers * names_per_writer,
        "no concurrent merge loses an unrelated name"
    );
    for w in 0..writers {
        for i in 0..names_per_writer {
            assert_eq!(features[&format!("f_{w}_{i}")], (w * names_per_writer + i) as f64);
        }
    }
    assert_eq!(aggregator.len(), 1);
}

#[test]
fn conn_features_over_one_window() {
    let conn = |port: u64, state: &str, proto: &str| {
        json!({
            "id.resp_p": port,
            "conn_state": state,
            "id.resp_h": "192.168.1.9",
            "proto": proto,
            "duration": 2.0,
            "orig_bytes": 300.0,
            "resp_bytes": 2.0,
        })
    };
    let window = window(vec![
        ("conn", conn(80, "SF", "tcp")),
        ("conn", conn(443, "S0", "tcp")),
        ("conn", conn(53, "REJ", "udp")),
        ("conn", conn(80, "SF", "tcp")),
    ]);

    let features = ConnExtractor.extract(&window).unwrap();
    assert_eq!(features["conn_freq"], 4.0);
    assert_eq!(features["unique_ports"], 3.0);
    assert!(close(features["conn_duration_avg"], 2.0));
    // 300 / (2 + 1) = 100, exactly at the cap
    assert!(close(features["bytes_in_out_ratio"], 100.0));
    assert!(close(features["tcp_ratio"], 3.0 / 5.0));
    assert!(close(features["udp_ratio"], 1.0 / 5.0));
    // (S0 + REJ) / (SF count + 1)
    assert!(close(features["incomplete_conn_ratio"], 2.0 / 3.0));
    assert!(close(features["conn_rate"], 4.0 / 60.0));
    assert_eq!(features["dest_ip_entropy"], 0.0);
}

#[test]
fn conn_extract_fails_without_core_tuple() {
    let window = window(vec![(
        "conn",
        json!({ "id.resp_p": 80, "id.resp_h": "192.168.1.9", "proto": "tcp" }),
    )]);
    ConnExtractor
        .extract(&window)
        .expect_err("conn_state is required");
}

#[test]
fn dns_features_count_domains_and_failures() {
    let query = |name: &str, rcode: &str| {
        json!({ "query": name, "qtype_name": "A", "rcode_name": rcode, "trans_id": 7 })
    };
    let window = window(vec![
        ("dns", query("a.example.com", "NOERROR")),
        ("dns", query("b.example.com", "NXDOMAIN")),
        ("dns", query("a.example.com", "NOERROR")),
        ("dns", query("deep.sub.example.com", "NXDOMAIN")),
    ]);

    let features = DnsExtractor.extract(&window).unwrap();
    assert_eq!(features["dns_query_freq"], 4.0);
    assert_eq!(features["dns_unique_domains"], 3.0);
    assert!(close(features["nxdomain_ratio"], 0.5));
    // levels: 2, 2, 2, 3
    assert!(close(features["subdomain_level_avg"], 9.0 / 4.0));
    assert!(features["domain_entropy"] > 0.0);
}

#[test]
fn dns_pairs_queries_with_responses() {
    let window = window(vec![
        (
            "dns",
            json!({ "uid": "C1", "trans_id": 41, "query": "x.example.com", "ts": 10.0 }),
        ),
        (
            "dns",
            json!({
                "uid": "C1",
                "trans_id": 41,
                "query": "x.example.com",
                "ts": 10.5,
                "answers": ["93.184.216.34"],
            }),
        ),
        // response with no matching query contributes nothing
        (
            "dns",
            json!({ "uid": "C2", "trans_id": 99, "query": "y.example.com", "ts": 20.0, "answers": ["1.1.1.1"] }),
        ),
    ]);

    let features = DnsExtractor.extract(&window).unwrap();
    assert!(close(features["query_response_time_avg"], 0.5));
}

#[test]
fn http_features_flag_rare_methods_and_bad_uris() {
    let http = |method: &str, uri: &str, status: u64| {
        json!({ "method": method, "uri": uri, "status_code": status, "host": "site.example" })
    };
    let window = window(vec![
        ("http", http("GET", "/index.html", 200)),
        ("http", http("DELETE", "/admin", 403)),
        ("http", http("GET", "/search?q=a%27--", 500)),
        ("http", http("POST", "/../etc/passwd", 404)),
    ]);

    let features = HttpExtractor.extract(&window).unwrap();
    assert_eq!(features["rare_http_methods"], 1.0);
    assert_eq!(features["uri_anomalies"], 2.0);
    assert!(close(features["client_error_ratio"], 2.0 / 4.0));
    assert!(close(features["server_error_ratio"], 1.0 / 4.0));
    assert!(close(features["auth_error_ratio"], 1.0 / 4.0));
    assert_eq!(features["host_entropy"], 0.0);
}

#[test]
fn ssl_features_flag_weak_material() {
    let window = window(vec![
        (
            "ssl",
            json!({
                "version": "SSLv3",
                "cipher": "TLS_RSA_WITH_RC4_128_SHA",
                "issuer": "CN=self",
                "subject": "CN=self",
                "established": false,
            }),
        ),
        (
            "ssl",
            json!({
                "version": "TLSv12",
                "cipher": "TLS_AES_256_GCM_SHA384",
                "issuer": "CN=ca",
                "subject": "CN=site",
                "established": true,
                "ja3": "771,4865-4866",
            }),
        ),
    ]);

    let features = SslExtractor.extract(&window).unwrap();
    assert_eq!(features["outdated_ssl_versions"], 1.0);
    assert_eq!(features["weak_ciphers"], 1.0);
    assert_eq!(features["self_signed_cert_count"], 1.0);
    assert!(close(features["handshake_failure_rate"], 0.5));
    assert!(close(features["ssl_version_entropy"], 1.0));
}

#[test]
fn notice_features_average_severity() {
    let notice = |note: &str, severity: &str| {
        json!({ "note": note, "severity": severity, "ts": 5.0 })
    };
    let window = window(vec![
        ("notice", notice("Scan::Port_Scan", "high")),
        ("notice", notice("SSL::Invalid_Server_Cert", "low")),
        ("notice", notice("Scan::Port_Scan", "medium")),
    ]);

    let features = NoticeExtractor.extract(&window).unwrap();
    assert_eq!(features["notice_count"], 3.0);
    assert!(close(features["average_severity"], 2.0));
    assert!(close(features["notice_rate"], 3.0 / 60.0));
    assert!(features["notice_type_entropy"] > 0.0);
}

#[test]
fn ssh_features_join_conn_and_count_attempts() {
    let window = window(vec![
        (
            "ssh",
            json!({
                "uid": "C-ssh1",
                "id.resp_h": "10.9.9.1",
                "id.resp_p": 22,
                "auth_success": true,
                "auth_attempts": 1,
                "cipher_alg": "aes256-ctr",
            }),
        ),
        (
            "ssh",
            json!({
                "uid": "C-ssh2",
                "id.resp_h": "10.9.9.2",
                "id.resp_p": 2222,
                "auth_success": false,
                // missing auth_attempts on a failed login still counts as one try
                "cipher_alg": "arcfour",
            }),
        ),
        ("conn", json!({ "uid": "C-ssh1", "duration": 30.0, "orig_bytes": 10.0, "resp_bytes": 40.0 })),
        ("conn", json!({ "uid": "C-ssh2", "duration": 10.0, "orig_bytes": 5.0, "resp_bytes": 5.0 })),
    ]);

    let features = SshExtractor.extract(&window).unwrap();
    assert_eq!(features["ssh_outgoing_connections"], 2.0);
    assert_eq!(features["ssh_unique_dest_ips"], 2.0);
    assert!(close(features["ssh_auth_success_ratio"], 0.5));
    assert!(close(features["ssh_avg_auth_attempts"], 1.0));
    assert_eq!(features["ssh_weak_algo_count"], 1.0);
    assert_eq!(features["ssh_non_standard_port_count"], 1.0);
    assert!(close(features["ssh_avg_duration"], 20.0));
    assert!(close(features["ssh_total_bytes"], 60.0));
}

#[test]
fn extractors_skip_windows_without_their_kind() {
    let window = window(vec![("conn", json!({
        "id.resp_p": 80,
        "conn_state": "SF",
        "id.resp_h": "192.168.1.9",
        "proto": "tcp",
    }))]);
    assert!(DnsExtractor.extract(&window).unwrap().is_empty());
    assert!(HttpExtractor.extract(&window).unwrap().is_empty());
    assert!(SslExtractor.extract(&window).unwrap().is_empty());
    assert!(NoticeExtractor.extract(&window).unwrap().is_empty());
    assert!(SshExtractor.extract(&window).unwrap().is_empty());
}

#[test]
fn every_emitted_feature_has_a_csv_column() {
    let columns: HashSet<&str> = FEATURE_COLUMNS.iter().copied().collect();
    assert_eq!(columns.len(), FEATURE_COLUMNS.len(), "no duplicate columns");

    let window = window(vec![
        (
            "conn",
            json!({
                "id.resp_p": 443,
                "conn_state": "SF",
                "id.resp_h": "192.168.1.9",
                "proto": "tcp",
            }),
        ),
        ("dns", json!({ "query": "example.com" })),
        ("http", json!({ "method": "GET", "uri": "/", "status_code": 200 })),
        ("ssl", json!({ "version": "TLSv13", "cipher": "TLS_AES_128_GCM_SHA256" })),
        ("notice", json!({ "note": "Scan::Port_Scan", "severity": "low" })),
        ("ssh", json!({ "uid": "C1", "id.resp_p": 22, "auth_success": true })),
    ]);

    let extractors: Vec<Box<dyn FeatureExtractor>> = vec![
        Box::new(ConnExtractor),
        Box::new(DnsExtractor),
        Box::new(HttpExtractor),
        Box::new(SslExtractor),
        Box::new(NoticeExtractor),
        Box::new(SshExtractor),
    ];
    let mut emitted = 0usize;
    for extractor in &extractors {
        let features = extractor.extract(&window).unwrap();
        assert!(!features.is_empty(), "{} produced nothing", extractor.name());
        for name in features.keys() {
            assert!(
                columns.contains(name.as_str()),
                "feature {name} missing from FEATURE_COLUMNS"
            );
        }
        emitted += features.len();
    }
    assert_eq!(emitted, FEATURE_COLUMNS.len(), "every column is produced");
}
