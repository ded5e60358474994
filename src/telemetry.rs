// src/telemetry.rs
use std::net::SocketAddr;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("relay_runs_total", "Runs started across all categories.");
        describe_counter!(
            "relay_runs_dropped_total",
            "Scheduled triggers dropped because a run was still in flight."
        );
        describe_counter!(
            "relay_items_delivered_total",
            "Items sent to a channel, labelled by category."
        );
        describe_counter!(
            "relay_dedup_skipped_total",
            "Candidates skipped because their link was already delivered."
        );
        describe_counter!(
            "relay_filtered_total",
            "Candidates rejected by the category keyword gate."
        );
        describe_counter!("relay_source_errors_total", "Feed sources that failed to fetch or parse.");
        describe_counter!(
            "relay_summary_fallback_total",
            "Items delivered with the fallback summary text."
        );
        describe_counter!("relay_entries_parsed_total", "Entries parsed from feeds.");
        describe_histogram!("relay_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("relay_last_run_ts", "Unix ts when the last run finished.");
    });
}

/// Install the Prometheus recorder with its own HTTP listener on `addr`.
pub fn install_prometheus(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
    ensure_metrics_described();
    Ok(())
}
