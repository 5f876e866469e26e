use anyhow::Context;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder once per process and return its render handle.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus metrics recorder")?;
    Ok(METRICS_HANDLE.get_or_init(|| handle).clone())
}

pub fn record_submission(store_len: usize) {
    counter!("incidents_submitted_total").increment(1);
    gauge!("incidents_in_store").set(store_len as f64);
}

pub fn record_rejected_submission() {
    counter!("submissions_rejected_total").increment(1);
}

pub fn record_image(bytes: usize) {
    counter!("image_ingest_total").increment(1);
    histogram!("image_bytes").record(bytes as f64);
}
