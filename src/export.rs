//! CSV export of the final feature table: one row per (identity, window),
//! fixed column order, absent features written as 0.0.

use std::path::Path;

use tracing::info;

use crate::features::FeatureTable;

/// Column order of the exported table after the two key columns, grouped
/// by the extractor that produces them. Training-side consumers key on
/// this ordering, so it only grows at the end of a group.
pub const FEATURE_COLUMNS: &[&str] = &[
    // conn
    "conn_freq",
    "unique_ports",
    "conn_duration_avg",
    "port_entropy",
    "conn_state_entropy",
    "bytes_in_out_ratio",
    "dest_ip_entropy",
    "source_ip_entropy",
    "udp_ratio",
    "tcp_ratio",
    "icmp_ratio",
    "conn_rate",
    "incomplete_conn_ratio",
    "conn_ts_variance",
    // dns
    "dns_query_freq",
    "dns_unique_domains",
    "domain_entropy",
    "qtype_entropy",
    "nxdomain_ratio",
    "query_length_entropy",
    "subdomain_level_avg",
    "query_response_time_avg",
    // http
    "rare_http_methods",
    "uri_anomalies",
    "uri_length_variance",
    "client_error_ratio",
    "server_error_ratio",
    "auth_error_ratio",
    "method_entropy",
    "user_agent_entropy",
    "body_length_variance",
    "host_entropy",
    "http_ts_variance",
    // ssl
    "outdated_ssl_versions",
    "weak_ciphers",
    "cipher_suite_entropy",
    "ja3_entropy",
    "self_signed_cert_count",
    "handshake_failure_rate",
    "ssl_version_entropy",
    // notice
    "notice_count",
    "notice_type_entropy",
    "average_severity",
    "notice_rate",
    "notice_ts_variance",
    // ssh
    "ssh_outgoing_connections",
    "ssh_unique_dest_ips",
    "ssh_auth_success_ratio",
    "ssh_server_software_entropy",
    "ssh_weak_algo_count",
    "ssh_avg_auth_attempts",
    "ssh_unique_dest_ports",
    "ssh_non_standard_port_count",
    "ssh_ts_variance",
    "ssh_avg_duration",
    "ssh_total_bytes",
    "ssh_cipher_algo_entropy",
    "ssh_hassh_entropy",
];

/// Writes the aggregated table as CSV, rows ordered by identity then
/// window start. Every row carries the full column set; features a window
/// never produced are written as 0.0.
pub fn export_csv(path: &Path, table: &FeatureTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["window_start", "identity"];
    header.extend_from_slice(FEATURE_COLUMNS);
    writer.write_record(&header)?;

    let mut rows = 0usize;
    for (identity, windows) in table {
        for (window_start, features) in windows {
            let mut row = Vec::with_capacity(FEATURE_COLUMNS.len() + 2);
            row.push(window_start.to_string());
            row.push(identity.clone());
            for column in FEATURE_COLUMNS {
                let value = features.get(*column).copied().unwrap_or(0.0);
                row.push(format!("{value:.4}"));
            }
            writer.write_record(&row)?;
            rows += 1;
        }
    }
    writer.flush()?;
    info!(rows, path = %path.display(), "feature csv written");
    Ok(())
}
